//! Data Models
//!
//! This module contains the core data structures used throughout SiteGraph:
//!
//! - `SitemapNode` - one page node of the sitemap tree
//! - `PlannedLink` / `LinkGraph` - the cross-link overlay and its projection
//! - `GenerationTask` / `GenerationEvent` - mirrored generation-run state
//! - `HistoryAction` - invertible mutation descriptors for undo/redo
//!
//! All wire-facing types serialize camelCase for the TypeScript presentation
//! layer.

mod history;
mod link;
mod node;
mod task;

pub use history::HistoryAction;
pub use link::{
    ApplyOutcome, LinkGraph, LinkGraphEdge, LinkGraphNode, LinkPlan, LinkSource, LinkStatus,
    LinkSuggestion, PlannedLink,
};
pub use node::{slugify, ContentStatus, CreateNodeInput, NodeUpdate, SitemapNode};
pub use task::{
    GenerationEvent, GenerationNodeInfo, GenerationStatus, GenerationTask, NodeGenerationStatus,
    ProgressCounts,
};
