//! Generation Task Tracker
//!
//! Mirrors long-running content-generation tasks owned by the remote task
//! service. Local state is mutated exclusively by inbound
//! [`GenerationEvent`]s flowing through the single reducer
//! [`GenerationTracker::handle_event`], plus the optimistic status flips of
//! the three user commands (pause, resume, cancel).
//!
//! # Upsert semantics
//!
//! Event delivery order across a concurrent multi-node run is not
//! guaranteed: a "completed" may arrive for a node never seen as
//! "generating". The reducer upserts the per-node entry rather than
//! rejecting the event, and progress counters are taken verbatim from the
//! event payloads - the backend may batch updates, so counters are never
//! recomputed from the per-node list.
//!
//! # Canvas refresh debouncing
//!
//! A burst of per-node events should cause one canvas reload, not N. The
//! [`RefreshDebouncer`] coalesces refresh requests behind a fixed delay:
//! the background task sleeps out the window, drains every trigger that
//! arrived meanwhile, and emits a single refresh signal.

use crate::models::{
    GenerationEvent, GenerationNodeInfo, GenerationStatus, GenerationTask, NodeGenerationStatus,
};
use crate::services::error::SitemapError;
use crate::services::remote::TaskStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Delay behind which canvas refresh requests are coalesced.
pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Trigger channel capacity. Tiny on purpose: a full channel means the
/// debouncer is already awake and will drain the burst anyway.
const TRIGGER_CHANNEL_CAPACITY: usize = 16;

/// Coalesces bursts of refresh requests into single refresh signals.
///
/// Cloneable handle over a background task: each burst of [`Self::request`]
/// calls within the delay window produces exactly one `()` on the refresh
/// receiver handed out at construction.
#[derive(Clone)]
pub struct RefreshDebouncer {
    trigger_tx: mpsc::Sender<()>,
}

impl RefreshDebouncer {
    /// Debouncer with the production delay.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        Self::with_delay(REFRESH_DEBOUNCE)
    }

    /// Debouncer with an explicit delay (tests).
    pub fn with_delay(delay: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(TRIGGER_CHANNEL_CAPACITY);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while trigger_rx.recv().await.is_some() {
                tokio::time::sleep(delay).await;
                // Drain the burst that arrived during the window.
                while trigger_rx.try_recv().is_ok() {}
                if refresh_tx.send(()).is_err() {
                    break; // receiver dropped, nobody to refresh
                }
            }
            tracing::debug!("RefreshDebouncer task shutting down");
        });

        (Self { trigger_tx }, refresh_rx)
    }

    /// Request a refresh. Non-blocking; rapid requests are coalesced.
    pub fn request(&self) {
        match self.trigger_tx.try_send(()) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Debouncer is already awake; the pending window covers us.
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("RefreshDebouncer has shut down, request ignored");
            }
        }
    }
}

/// Tracker for the generation tasks of one editing session.
///
/// Tasks are keyed by their opaque id; terminal tasks stay visible until
/// dismissed.
pub struct GenerationTracker {
    store: Arc<dyn TaskStore>,
    tasks: HashMap<String, GenerationTask>,
    refresh: RefreshDebouncer,
}

impl GenerationTracker {
    /// Build a tracker and the refresh signal stream the canvas listens to.
    pub fn new(store: Arc<dyn TaskStore>) -> (Self, mpsc::UnboundedReceiver<()>) {
        Self::with_debounce(store, REFRESH_DEBOUNCE)
    }

    /// Tracker with an explicit debounce delay (tests).
    pub fn with_debounce(
        store: Arc<dyn TaskStore>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (refresh, refresh_rx) = RefreshDebouncer::with_delay(delay);
        (
            Self {
                store,
                tasks: HashMap::new(),
                refresh,
            },
            refresh_rx,
        )
    }

    pub fn task(&self, id: &str) -> Option<&GenerationTask> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &GenerationTask> {
        self.tasks.values()
    }

    /// The first non-terminal task of a sitemap, if any.
    pub fn active_task(&self, sitemap_id: i64) -> Option<&GenerationTask> {
        self.tasks
            .values()
            .find(|t| t.sitemap_id == sitemap_id && !t.status.is_terminal())
    }

    /// Best-effort probe for tasks already running when the editor mounts.
    /// Failures are logged at debug and swallowed - silent by design, the
    /// event stream will catch the tracker up anyway.
    pub async fn sync_active(&mut self, sitemap_id: i64) {
        match self.store.list_active_tasks(sitemap_id).await {
            Ok(tasks) => {
                for task in tasks {
                    self.tasks.insert(task.id.clone(), task);
                }
            }
            Err(err) => {
                tracing::debug!("Active-task probe for sitemap {sitemap_id} failed: {err}");
            }
        }
    }

    /// The single reducer for the inbound event stream.
    ///
    /// Task-level events for unknown tasks (other than `TaskStarted`) are
    /// dropped with a debug log: without a start snapshot there is nothing
    /// to update, and the next probe or start event resolves it.
    pub fn handle_event(&mut self, event: GenerationEvent) {
        let is_node_event = event.is_node_event();

        match event {
            GenerationEvent::TaskStarted { task } => {
                tracing::info!("Generation task {} started ({} nodes)", task.id, task.total_nodes);
                self.tasks.insert(task.id.clone(), task);
            }
            GenerationEvent::TaskProgress { task_id, counts } => {
                self.with_task(&task_id, |task| {
                    task.total_nodes = counts.total_nodes;
                    task.processed_nodes = counts.processed_nodes;
                    task.failed_nodes = counts.failed_nodes;
                    task.skipped_nodes = counts.skipped_nodes;
                });
            }
            GenerationEvent::TaskPaused { task_id } => {
                self.with_task(&task_id, |task| {
                    if !task.status.is_terminal() {
                        task.status = GenerationStatus::Paused;
                    }
                });
            }
            GenerationEvent::TaskResumed { task_id } => {
                self.with_task(&task_id, |task| {
                    if !task.status.is_terminal() {
                        task.status = GenerationStatus::Running;
                    }
                });
            }
            GenerationEvent::TaskCompleted { task_id, counts } => {
                tracing::info!("Generation task {task_id} completed");
                self.with_task(&task_id, |task| {
                    task.status = GenerationStatus::Completed;
                    task.total_nodes = counts.total_nodes;
                    task.processed_nodes = counts.processed_nodes;
                    task.failed_nodes = counts.failed_nodes;
                    task.skipped_nodes = counts.skipped_nodes;
                });
            }
            GenerationEvent::TaskFailed { task_id, error } => {
                tracing::warn!("Generation task {task_id} failed: {error}");
                self.with_task(&task_id, |task| {
                    task.status = GenerationStatus::Failed;
                    task.error = Some(error);
                });
            }
            GenerationEvent::TaskCancelled { task_id } => {
                self.with_task(&task_id, |task| {
                    task.status = GenerationStatus::Cancelled;
                });
            }
            GenerationEvent::NodeGenerating { task_id, node_id } => {
                self.upsert_node(&task_id, node_id, |info| {
                    info.status = NodeGenerationStatus::Generating;
                });
            }
            GenerationEvent::NodePublishing { task_id, node_id } => {
                self.upsert_node(&task_id, node_id, |info| {
                    info.status = NodeGenerationStatus::Publishing;
                });
            }
            GenerationEvent::NodeCompleted {
                task_id,
                node_id,
                result_ref,
            } => {
                self.upsert_node(&task_id, node_id, |info| {
                    info.status = NodeGenerationStatus::Completed;
                    info.result_ref = result_ref;
                });
            }
            GenerationEvent::NodeFailed {
                task_id,
                node_id,
                error,
            } => {
                self.upsert_node(&task_id, node_id, |info| {
                    info.status = NodeGenerationStatus::Failed;
                    info.error = Some(error);
                });
            }
            GenerationEvent::NodeSkipped { task_id, node_id } => {
                self.upsert_node(&task_id, node_id, |info| {
                    info.status = NodeGenerationStatus::Skipped;
                });
            }
        }

        if is_node_event {
            self.refresh.request();
        }
    }

    fn with_task(&mut self, task_id: &str, apply: impl FnOnce(&mut GenerationTask)) {
        match self.tasks.get_mut(task_id) {
            Some(task) => apply(task),
            None => {
                tracing::debug!("Event for unknown generation task {task_id} dropped");
            }
        }
    }

    /// Upsert one per-node entry. A node never mentioned by the start
    /// payload still gets an entry - no event is dropped for missing prior
    /// state.
    fn upsert_node(
        &mut self,
        task_id: &str,
        node_id: i64,
        apply: impl FnOnce(&mut GenerationNodeInfo),
    ) {
        self.with_task(task_id, |task| {
            match task.nodes.iter_mut().find(|n| n.node_id == node_id) {
                Some(info) => apply(info),
                None => {
                    let mut info = GenerationNodeInfo::pending(node_id);
                    apply(&mut info);
                    task.nodes.push(info);
                }
            }
        });
    }

    /// Pause a running task: local status flips immediately, the remote
    /// request is fire-and-forget, and a later event corrects any
    /// disagreement.
    pub async fn pause(&mut self, task_id: &str) -> Result<(), SitemapError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| SitemapError::task_not_found(task_id))?;
        if task.status != GenerationStatus::Running {
            tracing::debug!("Pause ignored for task {task_id} in {:?}", task.status);
            return Ok(());
        }
        task.status = GenerationStatus::Paused;
        self.store.pause(task_id).await?;
        Ok(())
    }

    /// Resume a paused task. Same optimistic discipline as [`Self::pause`].
    pub async fn resume(&mut self, task_id: &str) -> Result<(), SitemapError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| SitemapError::task_not_found(task_id))?;
        if task.status != GenerationStatus::Paused {
            tracing::debug!("Resume ignored for task {task_id} in {:?}", task.status);
            return Ok(());
        }
        task.status = GenerationStatus::Running;
        self.store.resume(task_id).await?;
        Ok(())
    }

    /// Cancel a non-terminal task. Same optimistic discipline as
    /// [`Self::pause`].
    pub async fn cancel(&mut self, task_id: &str) -> Result<(), SitemapError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| SitemapError::task_not_found(task_id))?;
        if task.status.is_terminal() {
            tracing::debug!("Cancel ignored for terminal task {task_id}");
            return Ok(());
        }
        task.status = GenerationStatus::Cancelled;
        self.store.cancel(task_id).await?;
        Ok(())
    }

    /// Drop a terminal task from tracked state (panel dismissed). Returns
    /// whether the task was removed; non-terminal tasks are kept.
    pub fn dismiss(&mut self, task_id: &str) -> bool {
        match self.tasks.get(task_id) {
            Some(task) if task.status.is_terminal() => {
                self.tasks.remove(task_id);
                true
            }
            Some(task) => {
                tracing::warn!(
                    "Refusing to dismiss task {task_id} still in {:?}",
                    task.status
                );
                false
            }
            None => false,
        }
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "generation_test.rs"]
mod generation_test;
