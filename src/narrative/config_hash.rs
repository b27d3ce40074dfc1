//! Staleness fingerprint for generated narratives.
//!
//! A narrative stores the hash of the configuration it was written for. The
//! hash is recomputed on every read; a mismatch means the block changed
//! since generation and the text no longer describes it.

use crate::models::{BlockSpec, DateWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Hex fingerprint of the parts of `spec` and `period` a narrative depends on.
///
/// Metric order and duplicates do not matter. Sort, limit and the time of
/// day do not participate.
pub fn config_hash(spec: &BlockSpec, period: &DateWindow) -> String {
    let metrics: BTreeSet<&str> = spec.metrics.iter().map(|metric| metric.as_str()).collect();
    let metrics: Vec<&str> = metrics.into_iter().collect();

    let canonical = [
        format!("metrics={}", metrics.join(",")),
        format!(
            "dimension={}",
            spec.dimension.as_ref().map_or("", |dimension| dimension.as_str())
        ),
        format!("visualization={}", spec.visualization),
        format!(
            "comparison={}:{}",
            spec.comparison.enabled, spec.comparison.kind
        ),
        format!("start={}", period.start.format("%Y-%m-%d")),
        format!("end={}", period.end.format("%Y-%m-%d")),
    ]
    .join("|");

    format!("{:016x}", xxh3_64(canonical.as_bytes()))
}

/// Whether `stored_hash` no longer matches the block's configuration
pub fn is_narrative_stale(stored_hash: &str, spec: &BlockSpec, period: &DateWindow) -> bool {
    stored_hash != config_hash(spec, period)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStatus {
    Missing,
    Stale,
    Current,
}

impl fmt::Display for NarrativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Stale => write!(f, "stale"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Narrative text as stored alongside a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNarrative {
    pub description: Option<String>,
    pub config_hash: Option<String>,
}

impl BlockNarrative {
    pub fn new(description: impl Into<String>, config_hash: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            config_hash: Some(config_hash.into()),
        }
    }

    pub fn status(&self, spec: &BlockSpec, period: &DateWindow) -> NarrativeStatus {
        match (&self.description, &self.config_hash) {
            (None, _) => NarrativeStatus::Missing,
            (Some(text), _) if text.trim().is_empty() => NarrativeStatus::Missing,
            (Some(_), Some(hash)) if !is_narrative_stale(hash, spec, period) => {
                NarrativeStatus::Current
            }
            (Some(_), _) => NarrativeStatus::Stale,
        }
    }
}
