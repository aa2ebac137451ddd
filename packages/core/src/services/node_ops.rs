//! Node Operations Controller
//!
//! Orchestrates create/delete/reparent/update of sitemap nodes. Every
//! operation follows the same discipline: (1) validate locally, (2) invoke
//! the remote node service, (3) on success record the matching
//! [`HistoryAction`], (4) trigger a tree reload. Nothing mutates local state
//! speculatively before the remote call resolves - with one exception,
//! canvas position dragging, which stays purely local until an explicit
//! [`NodeOperations::save_positions`] commits every dirtied coordinate in
//! one sequential batch.
//!
//! # Deletion semantics
//!
//! Deleting a node is never recursive: the server re-parents its children
//! up one level. Bulk delete therefore targets only the top-most nodes of
//! the selection (a node is skipped when any ancestor is also selected), so
//! a parent and its selected child never produce conflicting delete calls.
//! The root node is refused as a deletion target outright.

use crate::models::{CreateNodeInput, HistoryAction, NodeUpdate, SitemapNode};
use crate::services::error::SitemapError;
use crate::services::hierarchy::{self, TreeNode};
use crate::services::history::HistoryEngine;
use crate::services::remote::NodeStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Uncommitted canvas drag of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PositionDelta {
    from_x: f64,
    from_y: f64,
    to_x: f64,
    to_y: f64,
}

/// Controller for all node mutations of one sitemap.
///
/// Single-owner, `&mut self` discipline; the surrounding system is
/// single-threaded cooperative and awaits every remote call sequentially.
pub struct NodeOperations {
    sitemap_id: i64,
    store: Arc<dyn NodeStore>,
    history: HistoryEngine,
    nodes: Vec<SitemapNode>,
    dirty_positions: HashMap<i64, PositionDelta>,
}

impl NodeOperations {
    pub fn new(sitemap_id: i64, store: Arc<dyn NodeStore>) -> Self {
        Self {
            sitemap_id,
            store,
            history: HistoryEngine::default(),
            nodes: Vec::new(),
            dirty_positions: HashMap::new(),
        }
    }

    /// The last-loaded flat node set.
    pub fn nodes(&self) -> &[SitemapNode] {
        &self.nodes
    }

    /// Ordered forest over the current node set.
    pub fn forest(&self) -> Vec<TreeNode> {
        hierarchy::build_forest(&self.nodes)
    }

    pub fn find(&self, id: i64) -> Option<&SitemapNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn require(&self, id: i64) -> Result<&SitemapNode, SitemapError> {
        self.find(id).ok_or(SitemapError::NodeNotFound { id })
    }

    /// Full reconciling reload from the source of truth. Uncommitted drag
    /// positions are re-overlaid so a reload does not snap nodes back.
    pub async fn reload(&mut self) -> Result<(), SitemapError> {
        let mut nodes = self.store.list_nodes(self.sitemap_id).await?;
        self.dirty_positions.retain(|id, _| nodes.iter().any(|n| n.id == *id));
        for node in &mut nodes {
            if let Some(delta) = self.dirty_positions.get(&node.id) {
                node.position_x = delta.to_x;
                node.position_y = delta.to_y;
            }
        }
        tracing::debug!("Reloaded {} nodes for sitemap {}", nodes.len(), self.sitemap_id);
        self.nodes = nodes;
        Ok(())
    }

    /// Create a node; the server assigns id and position.
    pub async fn create_node(
        &mut self,
        input: CreateNodeInput,
    ) -> Result<SitemapNode, SitemapError> {
        let node = self.store.create_node(input).await?;
        tracing::info!("Created node {} ({})", node.id, node.slug);
        self.history.record(HistoryAction::CreateNode { node: node.clone() });
        self.reload().await?;
        Ok(node)
    }

    /// Create a node at an explicit canvas position (drag-to-empty-canvas
    /// flow).
    pub async fn create_node_at(
        &mut self,
        input: CreateNodeInput,
        x: f64,
        y: f64,
    ) -> Result<SitemapNode, SitemapError> {
        let node = self.store.create_node_at(input, x, y).await?;
        tracing::info!("Created node {} ({}) at ({x}, {y})", node.id, node.slug);
        self.history.record(HistoryAction::CreateNode { node: node.clone() });
        self.reload().await?;
        Ok(node)
    }

    /// Delete one node. Refused for the root; children climb one level
    /// server-side.
    pub async fn delete_node(&mut self, id: i64) -> Result<(), SitemapError> {
        let node = self.require(id)?;
        if node.is_root {
            return Err(SitemapError::RootDeletion { id });
        }
        let snapshot = node.clone();

        self.store.delete_node(id).await?;
        tracing::info!("Deleted node {id}");
        self.history.record(HistoryAction::DeleteNode { node: snapshot });
        self.reload().await?;
        Ok(())
    }

    /// Bulk delete: one sequential delete per top-most selected node.
    ///
    /// Sequential on purpose - history recording order stays deterministic.
    /// The root is skipped with a warning rather than aborting the batch.
    /// Returns the ids actually deleted.
    pub async fn delete_selection(
        &mut self,
        selection: &HashSet<i64>,
    ) -> Result<Vec<i64>, SitemapError> {
        let targets = hierarchy::topmost_selected(&self.nodes, selection);
        let mut deleted = Vec::with_capacity(targets.len());
        for id in targets {
            match self.find(id) {
                Some(node) if node.is_root => {
                    tracing::warn!("Skipping root node {id} in bulk delete");
                    continue;
                }
                Some(_) => {}
                None => continue, // already gone via an earlier cascade
            }
            self.delete_node(id).await?;
            deleted.push(id);
        }
        Ok(deleted)
    }

    /// Reparent a node. `None` detaches it to root level. Refused when the
    /// target parent is unknown or sits inside the node's own subtree.
    pub async fn move_node(
        &mut self,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<(), SitemapError> {
        let previous_parent_id = self.require(id)?.parent_id;
        if previous_parent_id == new_parent_id {
            return Ok(());
        }
        if let Some(parent_id) = new_parent_id {
            if self.find(parent_id).is_none() {
                return Err(SitemapError::UnknownParent { parent_id });
            }
            if hierarchy::descendant_ids(&self.nodes, id).contains(&parent_id) {
                return Err(SitemapError::CyclicMove {
                    node_id: id,
                    parent_id,
                });
            }
        }

        self.store.move_node(id, new_parent_id).await?;
        tracing::info!("Moved node {id} under {new_parent_id:?}");
        self.history.record(HistoryAction::MoveNode {
            node_id: id,
            previous_parent_id,
            new_parent_id,
        });
        self.reload().await?;
        Ok(())
    }

    /// Partially update node fields. An empty update is a cheap no-op that
    /// records no history.
    pub async fn update_node(&mut self, id: i64, update: NodeUpdate) -> Result<(), SitemapError> {
        if update.is_empty() {
            return Ok(());
        }
        let previous = update.snapshot_of(self.require(id)?);

        self.store.update_node(id, update.clone()).await?;
        tracing::info!("Updated node {id}");
        self.history.record(HistoryAction::UpdateNode {
            node_id: id,
            previous,
            next: update,
        });
        self.reload().await?;
        Ok(())
    }

    /// Move a node on the canvas, locally only. The first drag of a node
    /// captures its persisted position as the undo baseline; nothing is
    /// sent remotely until [`Self::save_positions`].
    pub fn set_position_local(&mut self, id: i64, x: f64, y: f64) -> Result<(), SitemapError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(SitemapError::NodeNotFound { id })?;

        let delta = self.dirty_positions.entry(id).or_insert(PositionDelta {
            from_x: node.position_x,
            from_y: node.position_y,
            to_x: x,
            to_y: y,
        });
        delta.to_x = x;
        delta.to_y = y;
        node.position_x = x;
        node.position_y = y;
        Ok(())
    }

    /// Commit every uncommitted drag in one sequential batch, recording one
    /// `MovePosition` action per node, then reload once.
    pub async fn save_positions(&mut self) -> Result<usize, SitemapError> {
        let mut deltas: Vec<(i64, PositionDelta)> = self
            .dirty_positions
            .iter()
            .map(|(id, delta)| (*id, *delta))
            .filter(|(_, d)| (d.from_x, d.from_y) != (d.to_x, d.to_y))
            .collect();
        deltas.sort_by_key(|(id, _)| *id);

        let mut saved = 0;
        for (id, delta) in deltas {
            self.store.update_position(id, delta.to_x, delta.to_y).await?;
            self.history.record(HistoryAction::MovePosition {
                node_id: id,
                previous_x: delta.from_x,
                previous_y: delta.from_y,
                new_x: delta.to_x,
                new_y: delta.to_y,
            });
            self.dirty_positions.remove(&id);
            saved += 1;
        }
        if saved > 0 {
            tracing::info!("Saved {saved} node positions");
            self.reload().await?;
        } else {
            self.dirty_positions.clear();
        }
        Ok(saved)
    }

    /// Undo the newest committed mutation, then reconcile.
    pub async fn undo(&mut self) -> Result<bool, SitemapError> {
        let store = Arc::clone(&self.store);
        let changed = self.history.undo(store.as_ref()).await?;
        if changed {
            self.reload().await?;
        }
        Ok(changed)
    }

    /// Redo the most recently undone mutation, then reconcile.
    pub async fn redo(&mut self) -> Result<bool, SitemapError> {
        let store = Arc::clone(&self.store);
        let changed = self.history.redo(store.as_ref()).await?;
        if changed {
            self.reload().await?;
        }
        Ok(changed)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "node_ops_test.rs"]
mod node_ops_test;
