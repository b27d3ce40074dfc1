//! Mock provider executor for resolution tests
//!
//! Records every query it receives and answers from a scripted behavior.

use async_trait::async_trait;
use block_engine::error::{EngineError, EngineResult};
use block_engine::query_builder::QueryDescriptor;
use block_engine::resolution::ProviderQueryExecutor;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ExecutorBehavior {
    /// Return these rows for every query
    Rows(Vec<Value>),
    /// Fail every query
    Fail,
    /// Fail queries whose window starts before the date, answer the rest
    FailWindowsBefore(NaiveDate, Vec<Value>),
}

/// Mock executor state for tracking calls
#[derive(Debug, Default, Clone)]
pub struct MockExecutorState {
    pub calls: Vec<(String, QueryDescriptor)>,
}

#[derive(Debug, Clone)]
pub struct MockExecutor {
    state: Arc<Mutex<MockExecutorState>>,
    behavior: ExecutorBehavior,
    delay: Option<Duration>,
}

impl MockExecutor {
    pub fn new(behavior: ExecutorBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockExecutorState::default())),
            behavior,
            delay: None,
        }
    }

    pub fn returning(rows: Vec<Value>) -> Self {
        Self::new(ExecutorBehavior::Rows(rows))
    }

    pub fn failing() -> Self {
        Self::new(ExecutorBehavior::Fail)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn queries(&self) -> Vec<QueryDescriptor> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, query)| query.clone())
            .collect()
    }
}

#[async_trait]
impl ProviderQueryExecutor for MockExecutor {
    async fn execute(&self, account_id: &str, query: &QueryDescriptor) -> EngineResult<Vec<Value>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push((account_id.to_string(), query.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            ExecutorBehavior::Rows(rows) => Ok(rows.clone()),
            ExecutorBehavior::Fail => Err(EngineError::provider_unavailable("mock provider down")),
            ExecutorBehavior::FailWindowsBefore(cutoff, rows) => {
                if query.filter.window.start < *cutoff {
                    Err(EngineError::provider_unavailable("mock provider rejected window"))
                } else {
                    Ok(rows.clone())
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
