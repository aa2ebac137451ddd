//! SiteGraph Core Editing Layer
//!
//! This crate provides the state management behind the visual sitemap
//! editor: a hierarchical tree of page nodes on an infinite canvas, an
//! overlay graph of cross-links with an approval workflow, and live
//! tracking of long-running content-generation tasks.
//!
//! # Architecture
//!
//! - **Flat records, derived tree**: nodes are stored as flat
//!   parent-pointer records; the hierarchy is rebuilt in memory on every
//!   reload
//! - **Request-then-reconcile**: mutations commit against the remote
//!   stores first and the local cache reloads afterwards; only canvas
//!   position dragging stays local until an explicit batch save
//! - **Replayable history**: every committed mutation records an
//!   invertible action for bounded undo/redo, including delete/recreate
//!   cycles that shift server-assigned identity
//! - **Event-driven progress**: generation runs are mirrored purely from
//!   an inbound event stream, debounced into single canvas refreshes
//!
//! # Modules
//!
//! - [`models`] - Data structures (SitemapNode, PlannedLink, GenerationTask, etc.)
//! - [`services`] - Editing services (NodeOperations, HistoryEngine, etc.)

pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
