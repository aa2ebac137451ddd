//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations. Illegal
//! states (bad link transitions, deleting the root) are rejected before any
//! remote call; remote failures are chained through the `Remote` variant and
//! abort the operation with local state untouched.

use crate::models::LinkStatus;
use thiserror::Error;

/// Service operation errors
///
/// Provides high-level error types for all service operations,
/// with detailed context and proper error chaining.
#[derive(Error, Debug)]
pub enum SitemapError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: i64 },

    /// Link not found by ID
    #[error("Link not found: {id}")]
    LinkNotFound { id: i64 },

    /// Generation task not found by ID
    #[error("Generation task not found: {id}")]
    TaskNotFound { id: String },

    /// The root node may never be deleted
    #[error("Cannot delete the root node (id {id})")]
    RootDeletion { id: i64 },

    /// A link's source and target must differ
    #[error("Self-link rejected for node {node_id}")]
    SelfLink { node_id: i64 },

    /// Link status transition outside the workflow table
    #[error("Illegal link transition for link {link_id}: {from:?} -> {to:?}")]
    IllegalLinkTransition {
        link_id: i64,
        from: LinkStatus,
        to: LinkStatus,
    },

    /// Reparent target does not exist in the loaded tree
    #[error("Unknown parent node: {parent_id}")]
    UnknownParent { parent_id: i64 },

    /// Reparent target sits inside the node's own subtree
    #[error("Cannot move node {node_id} under its own descendant {parent_id}")]
    CyclicMove { node_id: i64, parent_id: i64 },

    /// No active link plan has been opened yet
    #[error("No active link plan: {context}")]
    NoActivePlan { context: String },

    /// Remote service call failed; the operation was aborted and local
    /// state left unchanged
    #[error("Remote call failed: {0}")]
    Remote(#[from] anyhow::Error),
}

impl SitemapError {
    /// Create a node not found error
    pub fn node_not_found(id: i64) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create a link not found error
    pub fn link_not_found(id: i64) -> Self {
        Self::LinkNotFound { id }
    }

    /// Create a task not found error
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    /// Create an illegal link transition error
    pub fn illegal_transition(link_id: i64, from: LinkStatus, to: LinkStatus) -> Self {
        Self::IllegalLinkTransition { link_id, from, to }
    }

    /// Create a no-active-plan error
    pub fn no_active_plan(context: impl Into<String>) -> Self {
        Self::NoActivePlan {
            context: context.into(),
        }
    }
}
