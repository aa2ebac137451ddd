//! History Action Descriptors
//!
//! Every committed mutation records one [`HistoryAction`] carrying enough
//! data to both redo and undo its effect. Create/delete carry the full node
//! snapshot; updates and moves carry before/after deltas.
//!
//! # The mutable id slot
//!
//! History entries are immutable with ONE documented exception: when a
//! replay recreates a deleted node, the remote service assigns a fresh id,
//! and the engine rewrites the snapshot's `id` in place so a later replay
//! targets the right record. Identity is not stable across delete/recreate
//! cycles; the history tracks the latest known identity, not the identity
//! at record time.

use crate::models::{NodeUpdate, SitemapNode};
use serde::{Deserialize, Serialize};

/// One recorded, invertible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HistoryAction {
    /// A node was created. Undo deletes it; redo recreates it (rewriting
    /// the snapshot id to the newly assigned one).
    #[serde(rename_all = "camelCase")]
    CreateNode { node: SitemapNode },

    /// A node was deleted. Undo recreates it at its original canvas
    /// position (rewriting the snapshot id); redo deletes it again.
    #[serde(rename_all = "camelCase")]
    DeleteNode { node: SitemapNode },

    /// Node fields changed. Both deltas touch the same field subset.
    #[serde(rename_all = "camelCase")]
    UpdateNode {
        node_id: i64,
        previous: NodeUpdate,
        next: NodeUpdate,
    },

    /// A node was reparented. `None` means root-level/orphan.
    #[serde(rename_all = "camelCase")]
    MoveNode {
        node_id: i64,
        previous_parent_id: Option<i64>,
        new_parent_id: Option<i64>,
    },

    /// Canvas coordinates changed (batch position save).
    #[serde(rename_all = "camelCase")]
    MovePosition {
        node_id: i64,
        previous_x: f64,
        previous_y: f64,
        new_x: f64,
        new_y: f64,
    },
}

impl HistoryAction {
    /// The node the action targets, by its latest known identity.
    pub fn node_id(&self) -> i64 {
        match self {
            HistoryAction::CreateNode { node } | HistoryAction::DeleteNode { node } => node.id,
            HistoryAction::UpdateNode { node_id, .. }
            | HistoryAction::MoveNode { node_id, .. }
            | HistoryAction::MovePosition { node_id, .. } => *node_id,
        }
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryAction::CreateNode { .. } => "create_node",
            HistoryAction::DeleteNode { .. } => "delete_node",
            HistoryAction::UpdateNode { .. } => "update_node",
            HistoryAction::MoveNode { .. } => "move_node",
            HistoryAction::MovePosition { .. } => "move_position",
        }
    }
}
