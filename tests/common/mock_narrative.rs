//! Mock narrative service and sink for scheduler tests

use async_trait::async_trait;
use block_engine::error::{EngineError, EngineResult};
use block_engine::narrative::{
    BulkRunSummary, CancellationHandle, NarrativeRequest, NarrativeResponse, NarrativeService,
    NarrativeSink,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Narrative service that sleeps, then answers or fails by title
#[derive(Debug, Default)]
pub struct MockNarrativeService {
    delay: Duration,
    failing_titles: HashSet<String>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    started: Mutex<Vec<String>>,
}

impl MockNarrativeService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_for<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Highest number of concurrent `generate` calls observed
    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeService for MockNarrativeService {
    async fn generate(&self, request: NarrativeRequest) -> EngineResult<NarrativeResponse> {
        self.started.lock().unwrap().push(request.title.clone());
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.failing_titles.contains(&request.title) {
            return Err(EngineError::provider_unavailable("model overloaded"));
        }
        Ok(NarrativeResponse {
            analysis: format!(
                "{} performed steadily over {} rows",
                request.title,
                request.current_data.len()
            ),
        })
    }
}

/// Sink state for tracking callbacks
#[derive(Debug, Default, Clone)]
pub struct RecordingSinkState {
    pub done: Vec<(String, String, String)>,
    pub failed: Vec<String>,
    pub cancelled: Vec<BulkRunSummary>,
}

/// Sink that records callbacks and can cancel the run after N completions
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub state: Arc<Mutex<RecordingSinkState>>,
    cancel_after: Option<(usize, CancellationHandle)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(completions: usize, handle: CancellationHandle) -> Self {
        Self {
            state: Arc::default(),
            cancel_after: Some((completions, handle)),
        }
    }

    pub fn snapshot(&self) -> RecordingSinkState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeSink for RecordingSink {
    async fn on_block_done(&self, block_id: &str, description: &str, config_hash: &str) {
        let completed = {
            let mut state = self.state.lock().unwrap();
            state.done.push((
                block_id.to_string(),
                description.to_string(),
                config_hash.to_string(),
            ));
            state.done.len()
        };

        if let Some((threshold, handle)) = &self.cancel_after {
            if completed >= *threshold {
                handle.cancel();
            }
        }
    }

    async fn on_block_failed(&self, block_id: &str, _error: &EngineError) {
        self.state.lock().unwrap().failed.push(block_id.to_string());
    }

    async fn on_cancelled(&self, summary: &BulkRunSummary) {
        self.state.lock().unwrap().cancelled.push(*summary);
    }
}
