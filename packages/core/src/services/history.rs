//! History Engine - Bounded Undo/Redo Stacks
//!
//! A generic command history over [`HistoryAction`] descriptors. Actions are
//! recorded at the moment a mutation commits; undo pops past -> future and
//! applies the inverse effect through the remote node store, redo pops
//! future -> past and re-applies the forward effect.
//!
//! # Identity-shifting replays
//!
//! Undoing a deletion (or redoing a creation) recreates the node, and the
//! remote service assigns a NEW id. The engine rewrites the popped action's
//! stored snapshot id in place before moving it to the other stack, so the
//! next replay targets the right record. This is the single exception to
//! immutable history entries: identity is not stable across delete/recreate
//! cycles, and the history tracks the latest known identity.
//!
//! # Reconciliation
//!
//! A successful undo/redo reports `true`, and the owning controller MUST
//! force a full reload from the store: after a recreation path the local
//! optimistic state is wrong by construction (new id), so incremental
//! patching is unsafe.
//!
//! # Failure semantics
//!
//! If the store call fails, the popped action is pushed back onto the stack
//! it came from, the error is logged and surfaced, and no retry or
//! compensating action is attempted. Stacks stay ordered; the user can
//! simply retry.

use crate::models::HistoryAction;
use crate::services::error::SitemapError;
use crate::services::remote::NodeStore;
use std::collections::VecDeque;

/// Default bound of the past stack; the oldest entry is evicted first.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded undo/redo engine. Single-owner, `&mut self` discipline: the
/// surrounding system is single-threaded cooperative, so no internal lock
/// is needed - only the `is_applying` reentrancy guard.
#[derive(Debug)]
pub struct HistoryEngine {
    past: VecDeque<HistoryAction>,
    future: Vec<HistoryAction>,
    capacity: usize,
    /// True while a replay is in flight. `record` no-ops under this flag so
    /// changes the engine itself causes are never re-recorded.
    is_applying: bool,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity.min(64)),
            future: Vec::new(),
            capacity: capacity.max(1),
            is_applying: false,
        }
    }

    /// Record a committed mutation. Clears the future stack (a new timeline
    /// branch) and evicts the oldest entry at capacity. No-op during replay.
    pub fn record(&mut self, action: HistoryAction) {
        if self.is_applying {
            tracing::debug!(
                "History record skipped during replay: {}",
                action.kind()
            );
            return;
        }
        self.future.clear();
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        tracing::debug!("History recorded: {} (node {})", action.kind(), action.node_id());
        self.past.push_back(action);
    }

    /// Undo the newest past action. Returns `true` when an action was
    /// undone (the caller must then reload from the store), `false` when
    /// there was nothing to do or a replay is already running.
    pub async fn undo(&mut self, store: &dyn NodeStore) -> Result<bool, SitemapError> {
        if self.is_applying {
            return Ok(false);
        }
        let Some(mut action) = self.past.pop_back() else {
            return Ok(false);
        };

        self.is_applying = true;
        let result = apply_inverse(&mut action, store).await;
        self.is_applying = false;

        match result {
            Ok(()) => {
                tracing::info!("Undid {} (node {})", action.kind(), action.node_id());
                self.future.push(action);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    "Undo of {} failed, action restored to past stack: {}",
                    action.kind(),
                    err
                );
                self.past.push_back(action);
                Err(err.into())
            }
        }
    }

    /// Redo the most recently undone action. Symmetric to [`Self::undo`].
    pub async fn redo(&mut self, store: &dyn NodeStore) -> Result<bool, SitemapError> {
        if self.is_applying {
            return Ok(false);
        }
        let Some(mut action) = self.future.pop() else {
            return Ok(false);
        };

        self.is_applying = true;
        let result = apply_forward(&mut action, store).await;
        self.is_applying = false;

        match result {
            Ok(()) => {
                tracing::info!("Redid {} (node {})", action.kind(), action.node_id());
                if self.past.len() == self.capacity {
                    self.past.pop_front();
                }
                self.past.push_back(action);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    "Redo of {} failed, action restored to future stack: {}",
                    action.kind(),
                    err
                );
                self.future.push(action);
                Err(err.into())
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty() && !self.is_applying
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty() && !self.is_applying
    }

    /// Drop both stacks (e.g. when switching sitemaps).
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// True while a replay is applying its effect.
    pub fn is_applying(&self) -> bool {
        self.is_applying
    }

    #[cfg(test)]
    pub(crate) fn depths(&self) -> (usize, usize) {
        (self.past.len(), self.future.len())
    }

    #[cfg(test)]
    pub(crate) fn force_applying(&mut self, applying: bool) {
        self.is_applying = applying;
    }
}

/// Five-way inverse dispatch. Mutates the action in place on the
/// recreation path (id rewrite).
async fn apply_inverse(action: &mut HistoryAction, store: &dyn NodeStore) -> anyhow::Result<()> {
    match action {
        HistoryAction::CreateNode { node } => store.delete_node(node.id).await,
        HistoryAction::DeleteNode { node } => {
            let recreated = store
                .create_node_at(node.to_create_input(), node.position_x, node.position_y)
                .await?;
            // The id slot rewrite: a later redo must delete the NEW record.
            node.id = recreated.id;
            Ok(())
        }
        HistoryAction::UpdateNode {
            node_id, previous, ..
        } => store.update_node(*node_id, previous.clone()).await,
        HistoryAction::MoveNode {
            node_id,
            previous_parent_id,
            ..
        } => store.move_node(*node_id, *previous_parent_id).await,
        HistoryAction::MovePosition {
            node_id,
            previous_x,
            previous_y,
            ..
        } => store.update_position(*node_id, *previous_x, *previous_y).await,
    }
}

/// Five-way forward dispatch, mirroring [`apply_inverse`].
async fn apply_forward(action: &mut HistoryAction, store: &dyn NodeStore) -> anyhow::Result<()> {
    match action {
        HistoryAction::CreateNode { node } => {
            let recreated = store
                .create_node_at(node.to_create_input(), node.position_x, node.position_y)
                .await?;
            node.id = recreated.id;
            Ok(())
        }
        HistoryAction::DeleteNode { node } => store.delete_node(node.id).await,
        HistoryAction::UpdateNode { node_id, next, .. } => {
            store.update_node(*node_id, next.clone()).await
        }
        HistoryAction::MoveNode {
            node_id,
            new_parent_id,
            ..
        } => store.move_node(*node_id, *new_parent_id).await,
        HistoryAction::MovePosition {
            node_id,
            new_x,
            new_y,
            ..
        } => store.update_position(*node_id, *new_x, *new_y).await,
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;
