//! Business Services
//!
//! This module contains the core sitemap-editing services:
//!
//! - `NodeOperations` - node CRUD, reparenting, and position batching
//! - `HistoryEngine` - bounded undo/redo over recorded mutations
//! - `LinkPlanController` - cross-link approval workflow and bulk apply
//! - `GenerationTracker` - event-driven progress of generation runs
//! - `CanvasController` - selection set and gesture-to-operation mapping
//! - `hierarchy` - pure tree derivation over the flat node records
//!
//! Services coordinate between the remote stores and the editing session,
//! enforcing the structural invariants before any remote call is issued.

pub mod canvas;
pub mod error;
pub mod generation;
pub mod hierarchy;
pub mod history;
pub mod link_plan;
pub mod node_ops;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use canvas::{CanvasController, DragOutcome, DropTarget};
pub use error::SitemapError;
pub use generation::{GenerationTracker, RefreshDebouncer, REFRESH_DEBOUNCE};
pub use hierarchy::{build_forest, descendant_ids, root_of, topmost_selected, TreeNode};
pub use history::{HistoryEngine, DEFAULT_HISTORY_CAPACITY};
pub use link_plan::LinkPlanController;
pub use node_ops::NodeOperations;
pub use remote::{LinkStore, NodeStore, TaskStore};
