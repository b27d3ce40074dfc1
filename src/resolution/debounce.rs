use super::providers::ResolutionContext;
use super::resolver::BlockResolver;
use crate::error::EngineResult;
use crate::models::{BlockSpec, ResolvedDataset, Scope};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Debounced entry point for one block's resolution.
///
/// Each call to [`trigger`](Self::trigger) supersedes the ones before it.
/// A call that is superseded during the quiet period never resolves; a call
/// superseded while its request is in flight still runs but its result is
/// discarded, so only the most recently triggered configuration is applied.
#[derive(Debug)]
pub struct ResolutionTrigger {
    resolver: Arc<BlockResolver>,
    debounce: Duration,
    generation: AtomicU64,
}

impl ResolutionTrigger {
    pub fn new(resolver: Arc<BlockResolver>, debounce: Duration) -> Self {
        Self {
            resolver,
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    /// Request a resolution with the latest configuration.
    ///
    /// Returns `Ok(None)` when a newer trigger replaced this one.
    pub async fn trigger(
        &self,
        spec: BlockSpec,
        scope: Scope,
        ctx: ResolutionContext,
    ) -> EngineResult<Option<ResolvedDataset>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if !self.is_latest(generation) {
            debug!(block_id = %ctx.block_id, generation, "Trigger superseded during debounce");
            return Ok(None);
        }

        let dataset = self.resolver.resolve_block(&spec, &scope, &ctx).await?;
        if !self.is_latest(generation) {
            debug!(block_id = %ctx.block_id, generation, "Discarding stale resolution result");
            return Ok(None);
        }

        Ok(Some(dataset))
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
