//! Bulk narrative scheduler integration tests

mod common;

use block_engine::config::SchedulerConfig;
use block_engine::models::{Provenance, ResolvedDataset};
use block_engine::narrative::{
    config_hash, GenerationTask, GenerationTaskState, NarrativeScheduler,
};
use common::*;
use std::sync::Arc;
use std::time::Duration;

fn tasks(count: usize) -> Vec<GenerationTask> {
    (1..=count)
        .map(|i| {
            GenerationTask::new(
                format!("block-{i}"),
                format!("Block {i}"),
                daily_clicks_spec(),
                ResolvedDataset::new(Vec::new(), Provenance::Synthetic),
                window("2024-03-01", "2024-03-31"),
            )
        })
        .collect()
}

fn scheduler(service: &Arc<MockNarrativeService>) -> NarrativeScheduler {
    NarrativeScheduler::new(service.clone(), &SchedulerConfig::default())
}

#[tokio::test]
async fn test_never_more_than_three_tasks_running() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(30)));
    let scheduler = scheduler(&service);
    let sink = Arc::new(RecordingSink::new());

    let summary = scheduler.run_bulk_generation(tasks(7), sink.clone()).await;

    assert_eq!(service.max_running(), 3);
    assert_eq!(summary.total, 7);
    assert_eq!(summary.completed, 7);
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);

    let progress = scheduler.progress().unwrap();
    assert_eq!(progress.finished(), 7);
    assert!(progress.in_progress.is_empty());
    assert_eq!(sink.snapshot().done.len(), 7);
}

#[tokio::test]
async fn test_done_callback_carries_config_hash() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(1)));
    let sink = Arc::new(RecordingSink::new());

    scheduler(&service).run_bulk_generation(tasks(1), sink.clone()).await;

    let expected = config_hash(&daily_clicks_spec(), &window("2024-03-01", "2024-03-31"));
    let done = sink.snapshot().done;
    assert_eq!(done[0].0, "block-1");
    assert!(done[0].1.starts_with("Block 1"));
    assert_eq!(done[0].2, expected);
}

#[tokio::test]
async fn test_failed_task_does_not_stop_the_queue() {
    let service = Arc::new(
        MockNarrativeService::new(Duration::from_millis(5)).failing_for(["Block 2", "Block 5"]),
    );
    let scheduler = scheduler(&service);
    let sink = Arc::new(RecordingSink::new());

    let summary = scheduler.run_bulk_generation(tasks(6), sink.clone()).await;

    assert_eq!(summary.completed, 4);
    assert_eq!(summary.failed, 2);
    assert_eq!(service.started().len(), 6);
    assert_eq!(
        scheduler.task_state("block-2"),
        Some(GenerationTaskState::Failed)
    );
    assert_eq!(scheduler.task_state("block-3"), Some(GenerationTaskState::Done));

    let mut failed = sink.snapshot().failed;
    failed.sort();
    assert_eq!(failed, vec!["block-2".to_string(), "block-5".to_string()]);
}

#[tokio::test]
async fn test_cancellation_after_two_completions_leaves_queue_unstarted() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(20)));
    let scheduler = scheduler(&service);
    let sink = Arc::new(RecordingSink::cancelling_after(2, scheduler.cancel_handle()));

    let summary = scheduler.run_bulk_generation(tasks(7), sink.clone()).await;

    assert!(summary.cancelled);
    assert!(summary.completed + summary.failed < summary.total);
    assert!(summary.not_started >= 1);
    assert_eq!(
        summary.completed + summary.failed + summary.not_started,
        summary.total
    );
    assert!(service.max_running() <= 3);

    // In-flight work was allowed to finish
    assert_eq!(service.started().len(), summary.completed + summary.failed);

    let queued = (1..=7)
        .filter(|i| {
            scheduler.task_state(&format!("block-{i}")) == Some(GenerationTaskState::Queued)
        })
        .count();
    assert_eq!(queued, summary.not_started);
    assert!(scheduler.task_state("block-7") == Some(GenerationTaskState::Queued));

    let state = sink.snapshot();
    assert_eq!(state.cancelled.len(), 1);
    assert_eq!(state.cancelled[0], summary);
}

#[tokio::test]
async fn test_new_run_resets_cancellation() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(1)));
    let scheduler = scheduler(&service);

    scheduler.cancel();
    let summary = scheduler
        .run_bulk_generation(tasks(2), Arc::new(RecordingSink::new()))
        .await;

    assert!(!summary.cancelled);
    assert_eq!(summary.completed, 2);
}

#[tokio::test]
async fn test_subscribers_observe_terminal_state_then_clear() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(1)));
    let config = SchedulerConfig {
        max_concurrency: 3,
        completion_grace_ms: 30,
    };
    let scheduler = NarrativeScheduler::new(service, &config);
    let mut progress = scheduler.subscribe();

    scheduler
        .run_bulk_generation(tasks(3), Arc::new(RecordingSink::new()))
        .await;
    assert_eq!(progress.borrow_and_update().as_ref().map(|p| p.completed), Some(3));

    tokio::time::timeout(Duration::from_secs(2), progress.changed())
        .await
        .expect("progress should clear after the grace period")
        .unwrap();
    assert!(progress.borrow().is_none());
}

#[tokio::test]
async fn test_overlapping_runs_share_the_concurrency_bound() {
    let service = Arc::new(MockNarrativeService::new(Duration::from_millis(20)));
    let scheduler = scheduler(&service);
    let second = scheduler.clone();
    let first_sink = Arc::new(RecordingSink::new());
    let second_sink = Arc::new(RecordingSink::new());

    let (first_summary, second_summary) = tokio::join!(
        scheduler.run_bulk_generation(tasks(6), first_sink.clone()),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            second
                .run_bulk_generation(tasks(2), second_sink.clone())
                .await
        }
    );

    assert!(service.max_running() <= 3);
    assert_eq!(service.started().len(), 8);

    assert_eq!(first_summary.total, 6);
    assert_eq!(first_summary.completed, 6);
    assert_eq!(second_summary.total, 2);
    assert_eq!(second_summary.completed, 2);
    assert_eq!(first_sink.snapshot().done.len(), 6);
    assert_eq!(second_sink.snapshot().done.len(), 2);

    // The later run owns the published progress
    assert_eq!(scheduler.progress().map(|p| p.total), Some(2));
}
