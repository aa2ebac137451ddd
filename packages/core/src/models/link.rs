//! Planned Link Data Structures
//!
//! A sitemap carries a second graph on top of the page tree: cross-links
//! between nodes that pass through an approval workflow before being applied
//! to the remote content system. This module defines the link record, its
//! closed status enumeration, and the derived `LinkGraph` projection.
//!
//! # Status lifecycle
//!
//! ```text
//! planned ──→ approved ──→ applying ──→ applied
//!    │                         │
//!    └──→ rejected             └──→ failed
//! ```
//!
//! `rejected`, `applied` and `failed` are terminal for the approval workflow.
//! Terminal links stay visible for audit until explicitly removed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Approval status of a planned link. Closed enumeration; any transition
/// outside [`LinkStatus::can_transition_to`] is an illegal-state error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Planned,
    Approved,
    Applying,
    Applied,
    Rejected,
    Failed,
}

impl LinkStatus {
    /// Whether the workflow allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: LinkStatus) -> bool {
        matches!(
            (self, next),
            (LinkStatus::Planned, LinkStatus::Approved)
                | (LinkStatus::Planned, LinkStatus::Rejected)
                | (LinkStatus::Approved, LinkStatus::Applying)
                | (LinkStatus::Applying, LinkStatus::Applied)
                | (LinkStatus::Applying, LinkStatus::Failed)
        )
    }

    /// Terminal for user-driven transitions (removal is still allowed).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LinkStatus::Rejected | LinkStatus::Applied | LinkStatus::Failed
        )
    }
}

/// Where a planned link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkSource {
    Manual,
    AiSuggested,
}

/// A planned cross-link between two sitemap nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedLink {
    /// Server-assigned identifier
    pub id: i64,

    /// Owning link plan
    pub plan_id: i64,

    /// Node the link originates from
    pub source_node_id: i64,

    /// Node the link points to
    pub target_node_id: i64,

    /// Anchor text to use when the link is applied
    pub anchor_text: String,

    /// Surrounding sentence/paragraph context for the anchor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_context: Option<String>,

    /// Suggestion confidence in [0, 1]; 1.0 for manual links
    pub confidence: f64,

    /// Provenance (manual gesture vs. AI suggestion)
    pub source: LinkSource,

    /// Current workflow status
    pub status: LinkStatus,
}

/// One link plan, scoped to a sitemap. Exactly one plan is active per tree
/// at a time; the remote service owns activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPlan {
    pub id: i64,
    pub sitemap_id: i64,
    pub site_id: i64,
}

/// Per-node entry of the derived link graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkGraphNode {
    pub node_id: i64,
    pub outgoing_link_count: usize,
    pub incoming_link_count: usize,
}

/// One edge of the derived link graph (one per planned link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkGraphEdge {
    pub link_id: i64,
    pub source_node_id: i64,
    pub target_node_id: i64,
    pub status: LinkStatus,
}

/// Derived, read-only projection over the current link set.
///
/// Recomputed by [`LinkGraph::derive`] on every link mutation; never patched
/// incrementally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkGraph {
    pub nodes: Vec<LinkGraphNode>,
    pub edges: Vec<LinkGraphEdge>,
}

impl LinkGraph {
    /// Single pass over the link set: one edge per link, per-node
    /// outgoing/incoming tallies.
    pub fn derive(links: &[PlannedLink]) -> LinkGraph {
        let mut counts: HashMap<i64, LinkGraphNode> = HashMap::new();
        let mut edges = Vec::with_capacity(links.len());

        for link in links {
            edges.push(LinkGraphEdge {
                link_id: link.id,
                source_node_id: link.source_node_id,
                target_node_id: link.target_node_id,
                status: link.status,
            });

            let source = counts.entry(link.source_node_id).or_insert(LinkGraphNode {
                node_id: link.source_node_id,
                ..Default::default()
            });
            source.outgoing_link_count += 1;

            let target = counts.entry(link.target_node_id).or_insert(LinkGraphNode {
                node_id: link.target_node_id,
                ..Default::default()
            });
            target.incoming_link_count += 1;
        }

        let mut nodes: Vec<LinkGraphNode> = counts.into_values().collect();
        nodes.sort_by_key(|entry| entry.node_id);

        LinkGraph { nodes, edges }
    }

    /// Counts entry for one node, if it participates in any link.
    pub fn node(&self, node_id: i64) -> Option<&LinkGraphNode> {
        self.nodes.iter().find(|entry| entry.node_id == node_id)
    }
}

/// One AI-proposed link, before it becomes a `planned` record.
///
/// The suggestion algorithm itself is external; the core only ingests its
/// output, always as `planned` / `ai-suggested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSuggestion {
    pub source_node_id: i64,
    pub target_node_id: i64,
    pub anchor_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_context: Option<String>,
    pub confidence: f64,
}

/// Result of a bulk apply call. Partial success is the expected shape:
/// every targeted link lands in exactly one of the two lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub applied: Vec<i64>,
    pub failed: Vec<i64>,
    pub total: usize,
}
