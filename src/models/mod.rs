pub mod block_spec;
pub mod dataset;
pub mod scope;

// Re-export core models for easy access
pub use block_spec::{
    BlockSpec, ComparisonKind, ComparisonSettings, DimensionId, MetricId, SortOrder, TimeBucket,
    Visualization, DEFAULT_LIMIT,
};
pub use dataset::{CacheSnapshot, CanonicalRow, Provenance, ResolvedDataset, SnapshotKey};
pub use scope::{DateWindow, Scope};
