//! Canvas Interaction Controller
//!
//! Translates pointer gestures into [`NodeOperations`] calls and maintains
//! the transient selection set. Selection lives purely in memory and is
//! never persisted; structural gestures (drag-connect, bulk delete) route
//! through the operations controller so they commit remotely and land in
//! history like any other mutation.

use crate::models::SitemapNode;
use crate::services::error::SitemapError;
use crate::services::hierarchy;
use crate::services::node_ops::NodeOperations;
use std::collections::HashSet;

/// Where a drag-connect gesture was released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropTarget {
    /// Released inside another node's visual bounds.
    Node(i64),
    /// Released over empty canvas, at these canvas coordinates.
    Canvas { x: f64, y: f64 },
}

/// What a released drag-connect resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// The drop target was reparented under the drag source.
    Reparented { node_id: i64, parent_id: i64 },
    /// Empty-canvas release: the presentation layer should open its
    /// create-child dialog for a new node under `parent_id` at (x, y).
    OpenCreateChild { parent_id: i64, x: f64, y: f64 },
    /// Self-drop, nothing to do.
    Ignored,
}

/// Selection state plus the gesture-to-operation mapping.
#[derive(Debug, Default)]
pub struct CanvasController {
    selection: HashSet<i64>,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &HashSet<i64> {
        &self.selection
    }

    pub fn is_selected(&self, node_id: i64) -> bool {
        self.selection.contains(&node_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Plain click: the target becomes the whole selection.
    pub fn click(&mut self, node_id: i64) {
        self.selection.clear();
        self.selection.insert(node_id);
    }

    /// Ctrl/Cmd-click: toggle just the one node.
    pub fn ctrl_click(&mut self, node_id: i64) {
        if !self.selection.remove(&node_id) {
            self.selection.insert(node_id);
        }
    }

    /// Shift-click: toggle the target's entire subtree as a unit.
    ///
    /// All-or-none semantics: if every node of the subtree is already
    /// selected the whole subtree is deselected, otherwise the whole
    /// subtree is selected (partial selections are completed, not
    /// inverted node by node).
    pub fn shift_click(&mut self, nodes: &[SitemapNode], node_id: i64) {
        let subtree = hierarchy::descendant_ids(nodes, node_id);
        let all_selected = subtree.iter().all(|id| self.selection.contains(id));
        if all_selected {
            for id in &subtree {
                self.selection.remove(id);
            }
        } else {
            self.selection.extend(&subtree);
        }
    }

    /// Delete everything selected through the operations controller and
    /// drop the deleted ids (plus their cascaded descendants) from the
    /// selection. Returns the ids actually deleted.
    pub async fn delete_selected(
        &mut self,
        ops: &mut NodeOperations,
    ) -> Result<Vec<i64>, SitemapError> {
        let deleted = ops.delete_selection(&self.selection).await?;
        // Reconcile against the reloaded tree rather than the delete list:
        // cascades and reparenting decide what actually survived.
        self.selection.retain(|id| ops.find(*id).is_some());
        Ok(deleted)
    }

    /// Resolve a released drag-connect gesture.
    ///
    /// Over another node the drop target is reparented under the drag
    /// source. Over empty canvas the gesture becomes a create-child
    /// request instead of silently failing.
    pub async fn release_drag(
        &mut self,
        ops: &mut NodeOperations,
        drag_source: i64,
        drop: DropTarget,
    ) -> Result<DragOutcome, SitemapError> {
        match drop {
            DropTarget::Node(target) if target == drag_source => {
                tracing::debug!("Drag from node {drag_source} released on itself");
                Ok(DragOutcome::Ignored)
            }
            DropTarget::Node(target) => {
                ops.move_node(target, Some(drag_source)).await?;
                Ok(DragOutcome::Reparented {
                    node_id: target,
                    parent_id: drag_source,
                })
            }
            DropTarget::Canvas { x, y } => Ok(DragOutcome::OpenCreateChild {
                parent_id: drag_source,
                x,
                y,
            }),
        }
    }
}
