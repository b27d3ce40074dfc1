//! # Narratives
//!
//! Written analysis attached to blocks. The text itself comes from an
//! external [`NarrativeService`]; this module schedules bulk generation and
//! tracks whether stored text still matches its block.

pub mod config_hash;
pub mod scheduler;
pub mod service;

pub use config_hash::{config_hash, is_narrative_stale, BlockNarrative, NarrativeStatus};
pub use scheduler::{
    BulkProgress, BulkRunSummary, CancellationHandle, GenerationTask, GenerationTaskState,
    NarrativeScheduler, NarrativeSink,
};
pub use service::{NarrativeRequest, NarrativeResponse, NarrativeService};
