use super::providers::SnapshotStore;
use crate::error::EngineResult;
use crate::models::{CacheSnapshot, ResolvedDataset, SnapshotKey};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Process-local snapshot store. Writes replace the whole entry, so readers
/// never observe a partial snapshot; concurrent writers are last-write-wins.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    entries: DashMap<SnapshotKey, CacheSnapshot>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seed an entry directly, bypassing the live-resolution path
    pub fn insert(&self, key: SnapshotKey, snapshot: CacheSnapshot) {
        self.entries.insert(key, snapshot);
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get(&self, key: &SnapshotKey) -> EngineResult<Option<CacheSnapshot>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &SnapshotKey, dataset: &ResolvedDataset) -> EngineResult<()> {
        let snapshot = CacheSnapshot::capture(dataset.clone());
        debug!(
            key = %key,
            rows = dataset.current_rows.len(),
            captured_at = %snapshot.captured_at,
            "Persisting snapshot"
        );
        self.entries.insert(key.clone(), snapshot);
        Ok(())
    }
}
