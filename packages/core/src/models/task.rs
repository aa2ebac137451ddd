//! Generation Task Data Structures
//!
//! A content-generation run is owned by the remote task service; the core
//! only mirrors it. Local state is mutated exclusively by inbound
//! [`GenerationEvent`]s (plus the optimistic flips of pause/resume/cancel),
//! reduced in one place (`services::generation`) so the upsert-on-out-of-
//! order-event guarantee is enforced in a single reducer.
//!
//! # Event contract
//!
//! Events are internally tagged (`{"type": "taskProgress", ...}`); each
//! payload carries the minimal delta. Event delivery order across a
//! concurrent multi-node run is NOT guaranteed, and progress counters are
//! authoritative from the event payloads (the backend may batch updates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall status of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl GenerationStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::Failed | GenerationStatus::Cancelled
        )
    }
}

/// Per-node pipeline status within a generation run.
///
/// The happy path is `pending → generating → publishing → completed`;
/// `failed` is reachable from any non-terminal stage and `skipped` only
/// from `pending`. The reducer upserts regardless, so a status arriving
/// without its predecessors is still applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeGenerationStatus {
    #[default]
    Pending,
    Generating,
    Publishing,
    Completed,
    Failed,
    Skipped,
}

/// Per-node progress entry of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationNodeInfo {
    pub node_id: i64,
    pub status: NodeGenerationStatus,
    /// Error message for `failed` nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reference to the generated content, once published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,
}

impl GenerationNodeInfo {
    pub fn pending(node_id: i64) -> Self {
        Self {
            node_id,
            status: NodeGenerationStatus::Pending,
            error: None,
            result_ref: None,
        }
    }
}

/// Snapshot of one generation run over a node subset.
///
/// Counters are authoritative from the event stream, never derived locally
/// from `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTask {
    /// Opaque task id minted by the remote task service
    pub id: String,

    /// Sitemap the run belongs to
    pub sitemap_id: i64,

    pub status: GenerationStatus,

    pub total_nodes: usize,
    pub processed_nodes: usize,
    pub failed_nodes: usize,
    pub skipped_nodes: usize,

    pub started_at: DateTime<Utc>,

    /// Task-level error for `failed` runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Per-node progress, upserted from events
    #[serde(default)]
    pub nodes: Vec<GenerationNodeInfo>,
}

impl GenerationTask {
    /// Per-node entry, if any event (or the start payload) introduced it.
    pub fn node(&self, node_id: i64) -> Option<&GenerationNodeInfo> {
        self.nodes.iter().find(|info| info.node_id == node_id)
    }
}

/// Authoritative progress counters carried by task-level events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCounts {
    pub total_nodes: usize,
    pub processed_nodes: usize,
    pub failed_nodes: usize,
    pub skipped_nodes: usize,
}

/// Inbound event union for generation runs.
///
/// Task-level events carry the task id plus the minimal payload; node-level
/// events additionally carry the node id. The reducer in
/// `services::generation` is the only consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationEvent {
    #[serde(rename_all = "camelCase")]
    TaskStarted { task: GenerationTask },
    #[serde(rename_all = "camelCase")]
    TaskProgress {
        task_id: String,
        counts: ProgressCounts,
    },
    #[serde(rename_all = "camelCase")]
    TaskPaused { task_id: String },
    #[serde(rename_all = "camelCase")]
    TaskResumed { task_id: String },
    #[serde(rename_all = "camelCase")]
    TaskCompleted {
        task_id: String,
        counts: ProgressCounts,
    },
    #[serde(rename_all = "camelCase")]
    TaskFailed { task_id: String, error: String },
    #[serde(rename_all = "camelCase")]
    TaskCancelled { task_id: String },
    #[serde(rename_all = "camelCase")]
    NodeGenerating { task_id: String, node_id: i64 },
    #[serde(rename_all = "camelCase")]
    NodePublishing { task_id: String, node_id: i64 },
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        task_id: String,
        node_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        task_id: String,
        node_id: i64,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    NodeSkipped { task_id: String, node_id: i64 },
}

impl GenerationEvent {
    /// Task id the event addresses.
    pub fn task_id(&self) -> &str {
        match self {
            GenerationEvent::TaskStarted { task } => &task.id,
            GenerationEvent::TaskProgress { task_id, .. }
            | GenerationEvent::TaskPaused { task_id }
            | GenerationEvent::TaskResumed { task_id }
            | GenerationEvent::TaskCompleted { task_id, .. }
            | GenerationEvent::TaskFailed { task_id, .. }
            | GenerationEvent::TaskCancelled { task_id }
            | GenerationEvent::NodeGenerating { task_id, .. }
            | GenerationEvent::NodePublishing { task_id, .. }
            | GenerationEvent::NodeCompleted { task_id, .. }
            | GenerationEvent::NodeFailed { task_id, .. }
            | GenerationEvent::NodeSkipped { task_id, .. } => task_id,
        }
    }

    /// True for per-node events (the ones that debounce a canvas refresh).
    pub fn is_node_event(&self) -> bool {
        matches!(
            self,
            GenerationEvent::NodeGenerating { .. }
                | GenerationEvent::NodePublishing { .. }
                | GenerationEvent::NodeCompleted { .. }
                | GenerationEvent::NodeFailed { .. }
                | GenerationEvent::NodeSkipped { .. }
        )
    }
}
