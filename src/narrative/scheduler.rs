//! # Bulk Narrative Scheduler
//!
//! Bounded worker pool that writes narratives for many blocks at once.
//!
//! Tasks sit in a shared queue; `max_concurrency` workers each pull the next
//! task, call the narrative service, and report the result through a
//! [`NarrativeSink`]. A failing task is recorded and the worker moves on.
//!
//! Cancellation flips a shared flag that workers check before dequeuing.
//! Calls already dispatched run to completion and are reported normally;
//! tasks still queued stay un-started.
//!
//! Runs on one scheduler are serialized: a run started while another is
//! active waits for it to finish, so `max_concurrency` bounds the number of
//! in-flight calls across all callers. A panicking narrative call is
//! recorded as a failure of that task.
//!
//! Progress is published on a watch channel. After a run finishes, the
//! final summary stays observable for `completion_grace` and is then cleared,
//! unless a newer run has started in the meantime.

use super::config_hash::config_hash;
use super::service::{NarrativeRequest, NarrativeService};
use crate::config::SchedulerConfig;
use crate::error::EngineError;
use crate::logging::log_narrative_operation;
use crate::models::{BlockSpec, DateWindow, ResolvedDataset};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

/// One block waiting for narrative text
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub block_id: String,
    pub title: String,
    pub spec: BlockSpec,
    pub dataset: ResolvedDataset,
    pub period: DateWindow,
}

impl GenerationTask {
    pub fn new(
        block_id: impl Into<String>,
        title: impl Into<String>,
        spec: BlockSpec,
        dataset: ResolvedDataset,
        period: DateWindow,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            title: title.into(),
            spec,
            dataset,
            period,
        }
    }

    pub fn request(&self) -> NarrativeRequest {
        NarrativeRequest {
            title: self.title.clone(),
            visualization: self.spec.visualization,
            metrics: self.spec.metrics.clone(),
            dimension: self.spec.dimension.clone(),
            period: self.period,
            current_data: self.dataset.current_rows.clone(),
            comparison_data: self
                .dataset
                .has_comparison()
                .then(|| self.dataset.comparison_rows.clone()),
        }
    }

    pub fn config_hash(&self) -> String {
        config_hash(&self.spec, &self.period)
    }
}

/// Lifecycle of a single task within a bulk run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTaskState {
    /// Waiting in the queue; stays here if the run is cancelled first
    Queued,
    /// Dispatched to the narrative service
    Running,
    /// Description written and reported to the sink
    Done,
    /// Service call errored, panicked or returned empty text
    Failed,
}

impl GenerationTaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for GenerationTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a bulk run as seen by observers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: Vec<String>,
}

impl BulkProgress {
    fn started(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRunSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Tasks never dispatched because the run was cancelled
    pub not_started: usize,
}

/// Receives per-block outcomes of a bulk run
#[async_trait]
pub trait NarrativeSink: Send + Sync {
    /// Persist `description` together with the hash of the config it describes
    async fn on_block_done(&self, block_id: &str, description: &str, config_hash: &str);

    async fn on_block_failed(&self, _block_id: &str, _error: &EngineError) {}

    /// Called once, after in-flight tasks settle, when the run was cancelled
    async fn on_cancelled(&self, _summary: &BulkRunSummary) {}
}

/// Shared cancellation flag for the current bulk run
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// State shared between the scheduler and its workers
#[derive(Debug)]
struct SchedulerShared {
    service: Arc<dyn NarrativeService>,
    cancel: CancellationHandle,
    progress: watch::Sender<Option<BulkProgress>>,
    task_states: DashMap<String, GenerationTaskState>,
    run_generation: AtomicU64,
    /// Held for the whole of a bulk run
    run_lock: AsyncMutex<()>,
}

/// Outcome counters owned by a single run
#[derive(Debug, Default)]
struct RunCounters {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl SchedulerShared {
    fn set_state(&self, block_id: &str, state: GenerationTaskState) {
        self.task_states.insert(block_id.to_string(), state);
    }

    fn update_progress(&self, update: impl FnOnce(&mut BulkProgress)) {
        self.progress.send_modify(|progress| {
            if let Some(progress) = progress.as_mut() {
                update(progress);
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct NarrativeScheduler {
    shared: Arc<SchedulerShared>,
    max_concurrency: usize,
    completion_grace: Duration,
}

impl NarrativeScheduler {
    pub fn new(service: Arc<dyn NarrativeService>, config: &SchedulerConfig) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            shared: Arc::new(SchedulerShared {
                service,
                cancel: CancellationHandle::default(),
                progress,
                task_states: DashMap::new(),
                run_generation: AtomicU64::new(0),
                run_lock: AsyncMutex::new(()),
            }),
            max_concurrency: config.max_concurrency.max(1),
            completion_grace: config.completion_grace(),
        }
    }

    pub fn cancel_handle(&self) -> CancellationHandle {
        self.shared.cancel.clone()
    }

    /// Stop dispatching new tasks in the current run
    pub fn cancel(&self) {
        info!("🛑 Bulk narrative generation cancellation requested");
        self.shared.cancel.cancel();
    }

    /// Current run's progress; `None` when idle
    pub fn progress(&self) -> Option<BulkProgress> {
        self.shared.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<BulkProgress>> {
        self.shared.progress.subscribe()
    }

    pub fn task_state(&self, block_id: &str) -> Option<GenerationTaskState> {
        self.shared.task_states.get(block_id).map(|state| *state)
    }

    /// Generate narratives for `tasks`, at most `max_concurrency` at a time.
    ///
    /// Waits for any run already in progress on this scheduler before
    /// starting.
    pub async fn run_bulk_generation(
        &self,
        tasks: Vec<GenerationTask>,
        sink: Arc<dyn NarrativeSink>,
    ) -> BulkRunSummary {
        let shared = &self.shared;
        let _run_guard = match shared.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Waiting for the active bulk narrative run to finish");
                shared.run_lock.lock().await
            }
        };
        let run_id = shared.run_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let total = tasks.len();

        shared.cancel.reset();
        shared.task_states.clear();
        for task in &tasks {
            shared.set_state(&task.block_id, GenerationTaskState::Queued);
        }
        shared.progress.send_replace(Some(BulkProgress::started(total)));

        let worker_count = self.max_concurrency.min(total);
        info!(
            run_id = run_id,
            total = total,
            workers = worker_count,
            "📝 Starting bulk narrative generation"
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let counters = Arc::new(RunCounters::default());
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let shared = shared.clone();
            let queue = queue.clone();
            let sink = sink.clone();
            let counters = counters.clone();
            handles.push(tokio::spawn(async move {
                run_worker(worker_id, shared, queue, counters, sink).await
            }));
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Narrative worker panicked");
            }
        }

        let summary = BulkRunSummary {
            total,
            completed: counters.completed.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            cancelled: shared.cancel.is_cancelled(),
            not_started: queue.lock().len(),
        };

        if summary.cancelled {
            warn!(
                run_id = run_id,
                completed = summary.completed,
                failed = summary.failed,
                not_started = summary.not_started,
                "Bulk narrative generation cancelled"
            );
            sink.on_cancelled(&summary).await;
        } else {
            info!(
                run_id = run_id,
                completed = summary.completed,
                failed = summary.failed,
                "✅ Bulk narrative generation finished"
            );
        }

        self.schedule_progress_clear(run_id);
        summary
    }

    fn schedule_progress_clear(&self, run_id: u64) {
        let shared = self.shared.clone();
        let grace = self.completion_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if shared.run_generation.load(Ordering::SeqCst) == run_id {
                shared.progress.send_replace(None);
                debug!(run_id = run_id, "Cleared bulk narrative progress");
            }
        });
    }
}

async fn run_worker(
    worker_id: usize,
    shared: Arc<SchedulerShared>,
    queue: Arc<Mutex<VecDeque<GenerationTask>>>,
    counters: Arc<RunCounters>,
    sink: Arc<dyn NarrativeSink>,
) {
    loop {
        if shared.cancel.is_cancelled() {
            debug!(worker_id = worker_id, "Worker stopping after cancellation");
            break;
        }
        let Some(task) = queue.lock().pop_front() else {
            break;
        };
        process_task(&shared, &counters, task, sink.as_ref()).await;
    }
}

async fn process_task(
    shared: &SchedulerShared,
    counters: &RunCounters,
    task: GenerationTask,
    sink: &dyn NarrativeSink,
) {
    let block_id = task.block_id.clone();
    shared.set_state(&block_id, GenerationTaskState::Running);
    shared.update_progress(|progress| progress.in_progress.push(block_id.clone()));
    log_narrative_operation(&block_id, "running", None);

    let outcome = AssertUnwindSafe(shared.service.generate(task.request()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(EngineError::Internal(panic_message(&*panic))))
        .and_then(|response| {
            if response.analysis.trim().is_empty() {
                Err(EngineError::Internal("empty analysis".to_string()))
            } else {
                Ok(response.analysis)
            }
        })
        .map_err(|e| match e {
            EngineError::NarrativeGenerationFailed { .. } => e,
            other => EngineError::NarrativeGenerationFailed {
                block_id: block_id.clone(),
                reason: other.to_string(),
            },
        });

    match outcome {
        Ok(description) => {
            let hash = task.config_hash();
            sink.on_block_done(&block_id, &description, &hash).await;
            shared.set_state(&block_id, GenerationTaskState::Done);
            counters.completed.fetch_add(1, Ordering::SeqCst);
            shared.update_progress(|progress| {
                progress.completed += 1;
                progress.in_progress.retain(|id| id != &block_id);
            });
            log_narrative_operation(&block_id, "done", Some(&hash));
        }
        Err(e) => {
            sink.on_block_failed(&block_id, &e).await;
            shared.set_state(&block_id, GenerationTaskState::Failed);
            counters.failed.fetch_add(1, Ordering::SeqCst);
            shared.update_progress(|progress| {
                progress.failed += 1;
                progress.in_progress.retain(|id| id != &block_id);
            });
            error!(block_id = %block_id, error = %e, "❌ Narrative generation failed");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("narrative service panicked: {detail}")
}
