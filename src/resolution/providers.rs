//! External collaborators the resolver depends on

use crate::error::{EngineError, EngineResult};
use crate::models::{CacheSnapshot, ResolvedDataset, SnapshotKey};
use crate::query_builder::QueryDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Runs a compiled query against one advertising-data provider
#[async_trait]
pub trait ProviderQueryExecutor: Send + Sync + Debug {
    /// Raw provider rows on success; any error is a live-fetch failure
    async fn execute(&self, account_id: &str, query: &QueryDescriptor) -> EngineResult<Vec<Value>>;

    fn provider_name(&self) -> &'static str;
}

/// Persists the last live resolution per block and report
#[async_trait]
pub trait SnapshotStore: Send + Sync + Debug {
    async fn get(&self, key: &SnapshotKey) -> EngineResult<Option<CacheSnapshot>>;

    async fn put(&self, key: &SnapshotKey, dataset: &ResolvedDataset) -> EngineResult<()>;
}

/// Whether the current consumer may trigger credentialed calls
pub trait AuthenticationContext: Send + Sync + Debug {
    fn is_authenticated(&self) -> bool;
}

/// Fixed authentication answer, for callers that already know it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthentication(pub bool);

impl AuthenticationContext for StaticAuthentication {
    fn is_authenticated(&self) -> bool {
        self.0
    }
}

/// Executor used when no provider client is wired in; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExecutor;

#[async_trait]
impl ProviderQueryExecutor for UnavailableExecutor {
    async fn execute(
        &self,
        _account_id: &str,
        _query: &QueryDescriptor,
    ) -> EngineResult<Vec<Value>> {
        Err(EngineError::provider_unavailable("no provider client configured"))
    }

    fn provider_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Identity of one resolution request
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub block_id: String,
    pub report_id: String,
    pub auth: Arc<dyn AuthenticationContext>,
}

impl ResolutionContext {
    pub fn new(
        block_id: impl Into<String>,
        report_id: impl Into<String>,
        auth: Arc<dyn AuthenticationContext>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            report_id: report_id.into(),
            auth,
        }
    }

    pub fn authenticated(block_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self::new(block_id, report_id, Arc::new(StaticAuthentication(true)))
    }

    /// Context for a public viewer, e.g. a shared report link
    pub fn anonymous(block_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self::new(block_id, report_id, Arc::new(StaticAuthentication(false)))
    }

    pub fn snapshot_key(&self) -> SnapshotKey {
        SnapshotKey::new(self.block_id.clone(), self.report_id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }
}
