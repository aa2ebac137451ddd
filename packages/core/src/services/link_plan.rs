//! Link Plan State Machine
//!
//! Owns the set of planned links for the one plan active per sitemap, and
//! enforces the approval workflow:
//!
//! ```text
//! planned -> {approved, rejected}
//! approved -> {applying}
//! applying -> {applied, failed}
//! ```
//!
//! Any transition outside the table is rejected as an illegal-state error
//! before a remote call is made - never silently ignored. Terminal links
//! (`rejected`, `applied`, `failed`) stay visible for audit; an operator
//! may still delete them.
//!
//! The [`LinkGraph`] projection is rederived by a single pass after every
//! mutation, never patched incrementally.

use crate::models::{
    ApplyOutcome, LinkGraph, LinkPlan, LinkSource, LinkStatus, LinkSuggestion, PlannedLink,
};
use crate::services::error::SitemapError;
use crate::services::remote::LinkStore;
use std::sync::Arc;

/// Controller for the active link plan of one sitemap.
pub struct LinkPlanController {
    store: Arc<dyn LinkStore>,
    plan: Option<LinkPlan>,
    links: Vec<PlannedLink>,
    graph: LinkGraph,
}

impl LinkPlanController {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            store,
            plan: None,
            links: Vec::new(),
            graph: LinkGraph::default(),
        }
    }

    /// Open (or create) the active plan for a sitemap and load its links.
    pub async fn open(&mut self, sitemap_id: i64, site_id: i64) -> Result<&LinkPlan, SitemapError> {
        let plan = self
            .store
            .get_or_create_active_plan(sitemap_id, site_id)
            .await?;
        let links = self.store.list_links(plan.id).await?;
        tracing::info!(
            "Opened link plan {} for sitemap {} with {} links",
            plan.id,
            sitemap_id,
            links.len()
        );
        self.links = links;
        self.rederive();
        Ok(self.plan.insert(plan))
    }

    pub fn plan(&self) -> Option<&LinkPlan> {
        self.plan.as_ref()
    }

    /// The current link set, terminal links included.
    pub fn links(&self) -> &[PlannedLink] {
        &self.links
    }

    /// The derived per-node counts and edges.
    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn link(&self, id: i64) -> Option<&PlannedLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Links touching a node in either direction (audit view).
    pub fn links_for_node(&self, node_id: i64) -> Vec<&PlannedLink> {
        self.links
            .iter()
            .filter(|l| l.source_node_id == node_id || l.target_node_id == node_id)
            .collect()
    }

    fn require_plan(&self, context: &str) -> Result<&LinkPlan, SitemapError> {
        self.plan
            .as_ref()
            .ok_or_else(|| SitemapError::no_active_plan(context))
    }

    fn rederive(&mut self) {
        self.graph = LinkGraph::derive(&self.links);
    }

    /// Create a `planned` link from a manual connection gesture.
    /// Self-links are rejected before the remote call.
    pub async fn add_link(
        &mut self,
        source_node_id: i64,
        target_node_id: i64,
        anchor_text: impl Into<String>,
        anchor_context: Option<String>,
    ) -> Result<PlannedLink, SitemapError> {
        if source_node_id == target_node_id {
            return Err(SitemapError::SelfLink {
                node_id: source_node_id,
            });
        }
        let plan_id = self.require_plan("add_link")?.id;

        let link = self
            .store
            .add_link(PlannedLink {
                id: 0, // server-assigned
                plan_id,
                source_node_id,
                target_node_id,
                anchor_text: anchor_text.into(),
                anchor_context,
                confidence: 1.0,
                source: LinkSource::Manual,
                status: LinkStatus::Planned,
            })
            .await?;
        tracing::info!(
            "Added link {} ({} -> {})",
            link.id,
            source_node_id,
            target_node_id
        );
        self.links.push(link.clone());
        self.rederive();
        Ok(link)
    }

    /// Ingest the output of a bulk suggestion run. Every accepted
    /// suggestion lands as `planned` / `ai-suggested`; self-links are
    /// dropped with a warning rather than failing the batch. Returns the
    /// number of links created.
    pub async fn ingest_suggestions(
        &mut self,
        suggestions: Vec<LinkSuggestion>,
    ) -> Result<usize, SitemapError> {
        let plan_id = self.require_plan("ingest_suggestions")?.id;

        let mut created = 0;
        for suggestion in suggestions {
            if suggestion.source_node_id == suggestion.target_node_id {
                tracing::warn!(
                    "Dropping self-link suggestion for node {}",
                    suggestion.source_node_id
                );
                continue;
            }
            let link = self
                .store
                .add_link(PlannedLink {
                    id: 0,
                    plan_id,
                    source_node_id: suggestion.source_node_id,
                    target_node_id: suggestion.target_node_id,
                    anchor_text: suggestion.anchor_text,
                    anchor_context: suggestion.anchor_context,
                    confidence: suggestion.confidence,
                    source: LinkSource::AiSuggested,
                    status: LinkStatus::Planned,
                })
                .await?;
            self.links.push(link);
            created += 1;
        }
        if created > 0 {
            tracing::info!("Ingested {created} suggested links");
            self.rederive();
        }
        Ok(created)
    }

    /// Delete a link at any status, terminal ones included.
    pub async fn remove_link(&mut self, id: i64) -> Result<(), SitemapError> {
        if self.link(id).is_none() {
            return Err(SitemapError::link_not_found(id));
        }
        self.store.remove_link(id).await?;
        tracing::info!("Removed link {id}");
        self.links.retain(|l| l.id != id);
        self.rederive();
        Ok(())
    }

    /// Approve a `planned` link.
    pub async fn approve(&mut self, id: i64) -> Result<(), SitemapError> {
        self.transition(id, LinkStatus::Approved).await
    }

    /// Reject a `planned` link. Rejecting twice fails: the second call is
    /// an illegal transition, not a silent no-op.
    pub async fn reject(&mut self, id: i64) -> Result<(), SitemapError> {
        self.transition(id, LinkStatus::Rejected).await
    }

    async fn transition(&mut self, id: i64, to: LinkStatus) -> Result<(), SitemapError> {
        let link = self
            .links
            .iter()
            .find(|l| l.id == id)
            .ok_or(SitemapError::LinkNotFound { id })?;
        if !link.status.can_transition_to(to) {
            return Err(SitemapError::illegal_transition(id, link.status, to));
        }

        match to {
            LinkStatus::Approved => self.store.approve_link(id).await?,
            LinkStatus::Rejected => self.store.reject_link(id).await?,
            // Applying/applied/failed flow through apply_links, never here.
            other => {
                return Err(SitemapError::illegal_transition(id, link.status, other));
            }
        }

        if let Some(link) = self.links.iter_mut().find(|l| l.id == id) {
            link.status = to;
        }
        tracing::info!("Link {id} -> {to:?}");
        self.rederive();
        Ok(())
    }

    /// Bulk-apply approved links through a content provider.
    ///
    /// Each targeted `approved` link moves to `applying` before the remote
    /// call; non-approved targets are skipped with a warning. The remote
    /// outcome is redistributed per link into `applied`/`failed` - partial
    /// success is expected. If the call itself fails, the `applying` flips
    /// are rolled back and local state is unchanged.
    pub async fn apply_links(
        &mut self,
        link_ids: &[i64],
        provider_id: i64,
    ) -> Result<ApplyOutcome, SitemapError> {
        let plan_id = self.require_plan("apply_links")?.id;

        let targets: Vec<i64> = link_ids
            .iter()
            .copied()
            .filter(|id| match self.link(*id) {
                Some(link) if link.status == LinkStatus::Approved => true,
                Some(link) => {
                    tracing::warn!(
                        "Skipping link {} in apply: status is {:?}, not approved",
                        id,
                        link.status
                    );
                    false
                }
                None => {
                    tracing::warn!("Skipping unknown link {id} in apply");
                    false
                }
            })
            .collect();
        if targets.is_empty() {
            return Ok(ApplyOutcome::default());
        }

        self.set_statuses(&targets, LinkStatus::Applying);

        let outcome = match self
            .store
            .apply_links(plan_id, targets.clone(), provider_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                // Aborted: nothing was applied, roll the flips back.
                self.set_statuses(&targets, LinkStatus::Approved);
                self.rederive();
                return Err(err.into());
            }
        };

        for link in &mut self.links {
            if link.status != LinkStatus::Applying || !targets.contains(&link.id) {
                continue;
            }
            if outcome.applied.contains(&link.id) {
                link.status = LinkStatus::Applied;
            } else if outcome.failed.contains(&link.id) {
                link.status = LinkStatus::Failed;
            } else {
                // The backend said nothing about this link; treat it as
                // not attempted and restore it for a later apply.
                tracing::warn!(
                    "Apply outcome omitted link {}; restoring to approved",
                    link.id
                );
                link.status = LinkStatus::Approved;
            }
        }
        tracing::info!(
            "Applied links: {} applied, {} failed of {}",
            outcome.applied.len(),
            outcome.failed.len(),
            outcome.total
        );
        self.rederive();
        Ok(outcome)
    }

    fn set_statuses(&mut self, ids: &[i64], status: LinkStatus) {
        for link in &mut self.links {
            if ids.contains(&link.id) {
                link.status = status;
            }
        }
    }
}
