//! Generation Task Tracker Tests
//!
//! Covers the reducer's upsert semantics under out-of-order events, the
//! authoritative counters, the optimistic command flips, dismissal rules,
//! and the refresh debouncer under a paused clock.

use crate::models::{
    GenerationEvent, GenerationNodeInfo, GenerationStatus, GenerationTask, NodeGenerationStatus,
    ProgressCounts,
};
use crate::services::generation::{GenerationTracker, RefreshDebouncer};
use crate::services::testing::MockTaskStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn task(id: &str, total: usize, node_ids: &[i64]) -> GenerationTask {
    GenerationTask {
        id: id.to_string(),
        sitemap_id: 1,
        status: GenerationStatus::Running,
        total_nodes: total,
        processed_nodes: 0,
        failed_nodes: 0,
        skipped_nodes: 0,
        started_at: Utc::now(),
        error: None,
        nodes: node_ids
            .iter()
            .map(|&id| GenerationNodeInfo::pending(id))
            .collect(),
    }
}

fn tracker() -> (GenerationTracker, mpsc::UnboundedReceiver<()>, Arc<MockTaskStore>) {
    let store = Arc::new(MockTaskStore::default());
    let (tracker, refresh_rx) = GenerationTracker::with_debounce(store.clone(), Duration::from_millis(500));
    (tracker, refresh_rx, store)
}

mod reducer_tests {
    use super::*;

    #[tokio::test]
    async fn out_of_order_completion_upserts_without_dropping() {
        let (mut tracker, _rx, _store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 10, &(1..=10).collect::<Vec<_>>()),
        });

        // Node 7 completes before node 3 was ever seen generating.
        tracker.handle_event(GenerationEvent::NodeCompleted {
            task_id: "t1".to_string(),
            node_id: 7,
            result_ref: Some("content-7".to_string()),
        });

        let snapshot = tracker.task("t1").unwrap();
        assert_eq!(
            snapshot.node(7).unwrap().status,
            NodeGenerationStatus::Completed
        );
        assert_eq!(
            snapshot.node(3).unwrap().status,
            NodeGenerationStatus::Pending,
            "unseen nodes stay pending"
        );
        assert_eq!(snapshot.node(7).unwrap().result_ref.as_deref(), Some("content-7"));
    }

    #[tokio::test]
    async fn node_event_for_node_missing_from_start_payload_is_upserted() {
        let (mut tracker, _rx, _store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 3, &[1, 2]),
        });

        tracker.handle_event(GenerationEvent::NodeGenerating {
            task_id: "t1".to_string(),
            node_id: 99,
        });

        let snapshot = tracker.task("t1").unwrap();
        assert_eq!(
            snapshot.node(99).unwrap().status,
            NodeGenerationStatus::Generating,
            "no event is dropped for missing prior state"
        );
        assert_eq!(snapshot.nodes.len(), 3);
    }

    #[tokio::test]
    async fn counters_come_from_events_not_the_node_list() {
        let (mut tracker, _rx, _store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 10, &[1, 2, 3]),
        });

        // The backend batches: counters say 5 processed even though the
        // local node list has seen none of it.
        tracker.handle_event(GenerationEvent::TaskProgress {
            task_id: "t1".to_string(),
            counts: ProgressCounts {
                total_nodes: 10,
                processed_nodes: 5,
                failed_nodes: 1,
                skipped_nodes: 2,
            },
        });

        let snapshot = tracker.task("t1").unwrap();
        assert_eq!(snapshot.processed_nodes, 5);
        assert_eq!(snapshot.failed_nodes, 1);
        assert_eq!(snapshot.skipped_nodes, 2);
    }

    #[tokio::test]
    async fn lifecycle_events_hit_terminal_states() {
        let (mut tracker, _rx, _store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 2, &[1, 2]),
        });
        tracker.handle_event(GenerationEvent::TaskPaused {
            task_id: "t1".to_string(),
        });
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Paused);

        tracker.handle_event(GenerationEvent::TaskResumed {
            task_id: "t1".to_string(),
        });
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Running);

        tracker.handle_event(GenerationEvent::TaskFailed {
            task_id: "t1".to_string(),
            error: "provider exploded".to_string(),
        });
        let snapshot = tracker.task("t1").unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("provider exploded"));

        // Terminal states do not regress on late pause/resume events.
        tracker.handle_event(GenerationEvent::TaskResumed {
            task_id: "t1".to_string(),
        });
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Failed);
    }

    #[tokio::test]
    async fn events_for_unknown_tasks_are_dropped_quietly() {
        let (mut tracker, _rx, _store) = tracker();
        tracker.handle_event(GenerationEvent::NodeCompleted {
            task_id: "ghost".to_string(),
            node_id: 1,
            result_ref: None,
        });
        assert!(tracker.task("ghost").is_none());
    }
}

mod command_tests {
    use super::*;

    #[tokio::test]
    async fn pause_flips_locally_and_calls_remote() {
        let (mut tracker, _rx, store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 2, &[1, 2]),
        });

        tracker.pause("t1").await.unwrap();
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Paused);
        assert_eq!(store.state.lock().unwrap().pause_calls, vec!["t1"]);

        tracker.resume("t1").await.unwrap();
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Running);
        assert_eq!(store.state.lock().unwrap().resume_calls, vec!["t1"]);
    }

    #[tokio::test]
    async fn optimistic_flip_survives_remote_failure_until_corrected() {
        let (mut tracker, _rx, store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 2, &[1, 2]),
        });

        store.fail_next();
        assert!(tracker.pause("t1").await.is_err());
        assert_eq!(
            tracker.task("t1").unwrap().status,
            GenerationStatus::Paused,
            "flip kept; the event stream is the authority"
        );

        // A later event disagrees and corrects the local state.
        tracker.handle_event(GenerationEvent::TaskResumed {
            task_id: "t1".to_string(),
        });
        assert_eq!(tracker.task("t1").unwrap().status, GenerationStatus::Running);
    }

    #[tokio::test]
    async fn pause_of_non_running_task_is_a_noop() {
        let (mut tracker, _rx, store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 2, &[1, 2]),
        });
        tracker.handle_event(GenerationEvent::TaskPaused {
            task_id: "t1".to_string(),
        });

        tracker.pause("t1").await.unwrap();
        assert!(store.state.lock().unwrap().pause_calls.is_empty());
    }

    #[tokio::test]
    async fn cancel_and_dismiss() {
        let (mut tracker, _rx, store) = tracker();
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 2, &[1, 2]),
        });

        assert!(!tracker.dismiss("t1"), "running tasks cannot be dismissed");

        tracker.cancel("t1").await.unwrap();
        assert_eq!(
            tracker.task("t1").unwrap().status,
            GenerationStatus::Cancelled
        );
        assert_eq!(store.state.lock().unwrap().cancel_calls, vec!["t1"]);

        assert!(tracker.dismiss("t1"));
        assert!(tracker.task("t1").is_none());
        assert!(!tracker.dismiss("t1"), "second dismiss finds nothing");
    }

    #[tokio::test]
    async fn commands_on_unknown_tasks_error() {
        let (mut tracker, _rx, _store) = tracker();
        assert!(tracker.pause("ghost").await.is_err());
        assert!(tracker.resume("ghost").await.is_err());
        assert!(tracker.cancel("ghost").await.is_err());
    }
}

mod probe_tests {
    use super::*;

    #[tokio::test]
    async fn sync_active_adopts_running_tasks() {
        let store = Arc::new(MockTaskStore::with_active(vec![task("t1", 4, &[1, 2])]));
        let (mut tracker, _rx) =
            GenerationTracker::with_debounce(store, Duration::from_millis(500));

        tracker.sync_active(1).await;
        assert!(tracker.active_task(1).is_some());
        assert_eq!(tracker.task("t1").unwrap().total_nodes, 4);
    }

    #[tokio::test]
    async fn sync_active_failure_is_silent() {
        let (mut tracker, _rx, store) = tracker();
        store.fail_next();
        tracker.sync_active(1).await; // must not panic or error
        assert!(tracker.active_task(1).is_none());
    }
}

mod debounce_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_of_requests_coalesces_to_one_refresh() {
        let (debouncer, mut refresh_rx) = RefreshDebouncer::with_delay(Duration::from_millis(500));

        for _ in 0..5 {
            debouncer.request();
        }

        refresh_rx.recv().await.expect("one refresh for the burst");
        assert!(
            refresh_rx.try_recv().is_err(),
            "five requests, one refresh"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_refresh_separately() {
        let (debouncer, mut refresh_rx) = RefreshDebouncer::with_delay(Duration::from_millis(500));

        debouncer.request();
        refresh_rx.recv().await.expect("first refresh");

        debouncer.request();
        debouncer.request();
        refresh_rx.recv().await.expect("second refresh");
        assert!(refresh_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn node_events_drive_the_debouncer() {
        let store = Arc::new(MockTaskStore::default());
        let (mut tracker, mut refresh_rx) =
            GenerationTracker::with_debounce(store, Duration::from_millis(500));
        tracker.handle_event(GenerationEvent::TaskStarted {
            task: task("t1", 3, &[1, 2, 3]),
        });
        // Task-level events alone request no refresh.
        tracker.handle_event(GenerationEvent::TaskProgress {
            task_id: "t1".to_string(),
            counts: ProgressCounts::default(),
        });

        for node_id in 1..=3 {
            tracker.handle_event(GenerationEvent::NodeCompleted {
                task_id: "t1".to_string(),
                node_id,
                result_ref: None,
            });
        }

        refresh_rx.recv().await.expect("one refresh for the burst");
        assert!(refresh_rx.try_recv().is_err());
    }
}
