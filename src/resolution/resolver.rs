//! # Block Resolver
//!
//! Resolves a block to a dataset through an ordered list of tiers. The plan
//! is decided up front from the caller's authentication and the scope:
//!
//! | caller                           | tiers                       |
//! |----------------------------------|-----------------------------|
//! | not authenticated                | snapshot, synthetic         |
//! | authenticated, account present   | live, snapshot, synthetic   |
//! | authenticated, no account        | synthetic                   |
//!
//! Each tier either yields a dataset or hands over to the next one. Synthetic
//! generation cannot fail, so every well-formed request resolves to some
//! dataset with an honest provenance tag. Only an invalid block spec is
//! surfaced to the caller.

use super::providers::{ProviderQueryExecutor, ResolutionContext, SnapshotStore};
use super::shaping::shape_rows;
use super::synthetic::SyntheticGenerator;
use crate::catalog::MetricCatalog;
use crate::comparison::previous_window;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::logging::log_resolution_outcome;
use crate::models::{BlockSpec, CanonicalRow, DateWindow, Provenance, ResolvedDataset, Scope};
use crate::normalizer::normalize;
use crate::query_builder::QueryCompiler;
use crate::resilience::CircuitBreaker;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Live,
    Snapshot,
    Synthetic,
}

impl ResolutionTier {
    /// Tiers to try, in order, for a request
    pub fn plan(authenticated: bool, has_live_source: bool) -> &'static [ResolutionTier] {
        match (authenticated, has_live_source) {
            (false, _) => &[Self::Snapshot, Self::Synthetic],
            (true, true) => &[Self::Live, Self::Snapshot, Self::Synthetic],
            (true, false) => &[Self::Synthetic],
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Resolves block specs to datasets
#[derive(Debug)]
pub struct BlockResolver {
    catalog: Arc<MetricCatalog>,
    compiler: QueryCompiler,
    executor: Arc<dyn ProviderQueryExecutor>,
    snapshots: Arc<dyn SnapshotStore>,
    synthetic: SyntheticGenerator,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    provider_timeout: Duration,
}

impl BlockResolver {
    pub fn new(
        executor: Arc<dyn ProviderQueryExecutor>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &EngineConfig,
    ) -> Self {
        Self::with_catalog(
            Arc::new(MetricCatalog::standard()),
            executor,
            snapshots,
            config,
        )
    }

    pub fn with_catalog(
        catalog: Arc<MetricCatalog>,
        executor: Arc<dyn ProviderQueryExecutor>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &EngineConfig,
    ) -> Self {
        let circuit_breaker = config.circuit_breaker.enabled.then(|| {
            Arc::new(CircuitBreaker::new(
                executor.provider_name(),
                &config.circuit_breaker,
            ))
        });

        Self {
            compiler: QueryCompiler::new(catalog.clone()),
            synthetic: SyntheticGenerator::new(
                catalog.clone(),
                config.resolution.synthetic_entity_count,
            ),
            catalog,
            executor,
            snapshots,
            circuit_breaker,
            provider_timeout: config.resolution.provider_timeout(),
        }
    }

    pub fn catalog(&self) -> &Arc<MetricCatalog> {
        &self.catalog
    }

    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.circuit_breaker.as_ref()
    }

    /// Resolve `spec` over `scope` for the caller described by `ctx`.
    ///
    /// Fails only with [`EngineError::InvalidSpec`]; every data-sourcing
    /// failure is absorbed by the fallback chain.
    #[instrument(skip_all, fields(block_id = %ctx.block_id, report_id = %ctx.report_id))]
    pub async fn resolve_block(
        &self,
        spec: &BlockSpec,
        scope: &Scope,
        ctx: &ResolutionContext,
    ) -> EngineResult<ResolvedDataset> {
        spec.validate()?;

        let request_id = Uuid::new_v4();
        let authenticated = ctx.is_authenticated();
        let plan = ResolutionTier::plan(authenticated, scope.has_live_source());
        debug!(
            request_id = %request_id,
            authenticated = authenticated,
            plan = ?plan,
            "Resolving block"
        );

        for tier in plan {
            let outcome = match tier {
                ResolutionTier::Live => self.resolve_live(spec, scope, ctx).await,
                ResolutionTier::Snapshot => self.resolve_snapshot(ctx).await,
                ResolutionTier::Synthetic => {
                    Some(self.synthetic.generate(spec, scope, &ctx.block_id))
                }
            };

            if let Some(dataset) = outcome {
                log_resolution_outcome(
                    &ctx.block_id,
                    &ctx.report_id,
                    dataset.provenance,
                    dataset.current_rows.len(),
                    dataset.comparison_rows.len(),
                );
                return Ok(dataset);
            }
            debug!(
                request_id = %request_id,
                tier = %tier,
                "Tier yielded no dataset, falling through"
            );
        }

        // Every plan ends with the synthetic tier
        Err(EngineError::Internal(format!(
            "resolution plan exhausted for block {}",
            ctx.block_id
        )))
    }

    async fn resolve_live(
        &self,
        spec: &BlockSpec,
        scope: &Scope,
        ctx: &ResolutionContext,
    ) -> Option<ResolvedDataset> {
        let comparison_window = spec
            .comparison
            .enabled
            .then(|| previous_window(&scope.window, spec.comparison.kind));

        let current = self.fetch_window(spec, scope, scope.window);
        let comparison = async {
            match comparison_window {
                Some(Ok(window)) => Some(self.fetch_window(spec, scope, window).await),
                Some(Err(error)) => Some(Err(error)),
                None => None,
            }
        };
        let (current, comparison) = tokio::join!(current, comparison);

        let current_rows = match current {
            Ok(rows) => rows,
            Err(error) => {
                warn!(
                    block_id = %ctx.block_id,
                    provider = self.executor.provider_name(),
                    error = %error,
                    "⚠️ Live fetch failed, falling back"
                );
                return None;
            }
        };

        let comparison_rows = match comparison {
            Some(Ok(rows)) => rows,
            Some(Err(error)) => {
                warn!(
                    block_id = %ctx.block_id,
                    error = %error,
                    "Comparison fetch failed, continuing without comparison data"
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        let dataset =
            ResolvedDataset::new(current_rows, Provenance::Live).with_comparison(comparison_rows);

        if let Err(error) = self.snapshots.put(&ctx.snapshot_key(), &dataset).await {
            warn!(
                block_id = %ctx.block_id,
                error = %error,
                "Failed to persist snapshot after live fetch"
            );
        }

        Some(dataset)
    }

    async fn resolve_snapshot(&self, ctx: &ResolutionContext) -> Option<ResolvedDataset> {
        match self.snapshots.get(&ctx.snapshot_key()).await {
            Ok(Some(snapshot)) => {
                info!(
                    block_id = %ctx.block_id,
                    captured_at = %snapshot.captured_at,
                    "Serving cached snapshot"
                );
                Some(snapshot.dataset.with_provenance(Provenance::Cached))
            }
            Ok(None) => None,
            Err(error) => {
                warn!(block_id = %ctx.block_id, error = %error, "Snapshot read failed");
                None
            }
        }
    }

    /// Compile, execute and normalize one window
    async fn fetch_window(
        &self,
        spec: &BlockSpec,
        scope: &Scope,
        window: DateWindow,
    ) -> EngineResult<Vec<CanonicalRow>> {
        let query = self.compiler.compile_for_window(spec, scope, window)?;
        let query = &query;
        let account_id = scope.account_id.trim();
        let executor = self.executor.as_ref();
        let provider_timeout = self.provider_timeout;

        let execute = move || async move {
            match tokio::time::timeout(provider_timeout, executor.execute(account_id, query)).await
            {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(format!(
                    "{} did not answer within {:?}",
                    executor.provider_name(),
                    provider_timeout
                ))),
            }
        };

        let provider_rows = match &self.circuit_breaker {
            Some(breaker) => breaker.call(execute).await?,
            None => execute().await?,
        };

        let rows = normalize(&provider_rows, spec, &self.catalog);
        Ok(shape_rows(&self.catalog, spec, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_plan_never_goes_live() {
        for has_source in [true, false] {
            let plan = ResolutionTier::plan(false, has_source);
            assert!(!plan.contains(&ResolutionTier::Live));
            assert_eq!(plan.last(), Some(&ResolutionTier::Synthetic));
        }
    }

    #[test]
    fn test_authenticated_plans() {
        assert_eq!(
            ResolutionTier::plan(true, true),
            &[
                ResolutionTier::Live,
                ResolutionTier::Snapshot,
                ResolutionTier::Synthetic
            ]
        );
        assert_eq!(ResolutionTier::plan(true, false), &[ResolutionTier::Synthetic]);
    }
}
