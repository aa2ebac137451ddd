//! Remote Collaborator Traits
//!
//! This module defines the async traits that abstract the remote CRUD
//! services the core talks to. The core is backend-agnostic: controllers
//! hold `Arc<dyn NodeStore>` (etc.) and never see a wire format.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method is async; all mutation-producing
//!    operations are awaited sequentially inside the initiating handler
//!    (request-then-reconcile, never optimistic; canvas dragging excepted).
//! 2. **Error Handling**: `anyhow::Result` at this boundary for flexible
//!    context; services convert into `SitemapError::Remote`.
//! 3. **No retries, no timeouts**: a stalled call is only discoverable
//!    through the caller's own request timeout.

use crate::models::{
    ApplyOutcome, CreateNodeInput, GenerationTask, LinkGraph, LinkPlan, NodeUpdate, PlannedLink,
    SitemapNode,
};
use async_trait::async_trait;

/// Remote node CRUD service.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Create a node; the server assigns id and canvas position.
    async fn create_node(&self, input: CreateNodeInput) -> anyhow::Result<SitemapNode>;

    /// Create a node at an explicit canvas position (undo-of-delete path).
    async fn create_node_at(
        &self,
        input: CreateNodeInput,
        x: f64,
        y: f64,
    ) -> anyhow::Result<SitemapNode>;

    /// Delete one node. Children are re-parented up one level server-side.
    async fn delete_node(&self, id: i64) -> anyhow::Result<()>;

    /// Partially update node fields.
    async fn update_node(&self, id: i64, update: NodeUpdate) -> anyhow::Result<()>;

    /// Reparent a node; `None` detaches it to root level.
    async fn move_node(&self, id: i64, new_parent_id: Option<i64>) -> anyhow::Result<()>;

    /// Persist one node's canvas coordinates.
    async fn update_position(&self, id: i64, x: f64, y: f64) -> anyhow::Result<()>;

    /// The flat node set of one sitemap (source of truth for reloads).
    async fn list_nodes(&self, sitemap_id: i64) -> anyhow::Result<Vec<SitemapNode>>;
}

/// Remote link-plan service.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// The active plan for a sitemap, created on first use.
    async fn get_or_create_active_plan(
        &self,
        sitemap_id: i64,
        site_id: i64,
    ) -> anyhow::Result<LinkPlan>;

    /// All links of one plan, terminal ones included.
    async fn list_links(&self, plan_id: i64) -> anyhow::Result<Vec<PlannedLink>>;

    /// Persist a new planned link; the server assigns the id.
    async fn add_link(&self, link: PlannedLink) -> anyhow::Result<PlannedLink>;

    async fn remove_link(&self, id: i64) -> anyhow::Result<()>;

    async fn approve_link(&self, id: i64) -> anyhow::Result<()>;

    async fn reject_link(&self, id: i64) -> anyhow::Result<()>;

    /// Bulk-apply approved links through a content provider. Partial
    /// success is expected; the outcome lists every targeted link exactly
    /// once.
    async fn apply_links(
        &self,
        plan_id: i64,
        link_ids: Vec<i64>,
        provider_id: i64,
    ) -> anyhow::Result<ApplyOutcome>;

    /// Server-side projection of the plan's link graph.
    async fn get_link_graph(&self, plan_id: i64) -> anyhow::Result<LinkGraph>;
}

/// Remote generation-task service. The inbound event channel is delivered
/// separately (see `services::generation`); these are the command and
/// snapshot calls.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Non-terminal tasks for a sitemap (best-effort probe on mount).
    async fn list_active_tasks(&self, sitemap_id: i64) -> anyhow::Result<Vec<GenerationTask>>;

    async fn get_task(&self, id: &str) -> anyhow::Result<GenerationTask>;

    /// Fire-and-forget pause request; the event stream confirms it.
    async fn pause(&self, id: &str) -> anyhow::Result<()>;

    async fn resume(&self, id: &str) -> anyhow::Result<()>;

    async fn cancel(&self, id: &str) -> anyhow::Result<()>;
}
