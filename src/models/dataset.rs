use super::block_spec::MetricId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A provider row flattened to metric/dimension identifiers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRow {
    pub dimension_value: Option<String>,
    pub values: BTreeMap<MetricId, f64>,
}

impl CanonicalRow {
    pub fn new(dimension_value: Option<String>) -> Self {
        Self {
            dimension_value,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, metric: impl Into<MetricId>, value: f64) -> Self {
        self.values.insert(metric.into(), value);
        self
    }

    /// Value of `metric`, zero when the row does not carry it
    pub fn value(&self, metric: &str) -> f64 {
        self.values.get(metric).copied().unwrap_or(0.0)
    }
}

/// Where a resolved dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched from the provider for this request
    Live,
    /// Served from the last persisted live snapshot
    Cached,
    /// Generated demo data; never shown as real figures
    Synthetic,
}

impl Provenance {
    /// Synthetic data must be flagged as demo data by consumers
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Cached => write!(f, "cached"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDataset {
    pub current_rows: Vec<CanonicalRow>,
    /// Empty when comparison is disabled or the comparison fetch failed
    pub comparison_rows: Vec<CanonicalRow>,
    pub provenance: Provenance,
}

impl ResolvedDataset {
    pub fn new(current_rows: Vec<CanonicalRow>, provenance: Provenance) -> Self {
        Self {
            current_rows,
            comparison_rows: Vec::new(),
            provenance,
        }
    }

    pub fn with_comparison(mut self, comparison_rows: Vec<CanonicalRow>) -> Self {
        self.comparison_rows = comparison_rows;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn has_comparison(&self) -> bool {
        !self.comparison_rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub block_id: String,
    pub report_id: String,
}

impl SnapshotKey {
    pub fn new(block_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            report_id: report_id.into(),
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.report_id, self.block_id)
    }
}

/// Persisted copy of the last successful live resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub dataset: ResolvedDataset,
    pub captured_at: DateTime<Utc>,
}

impl CacheSnapshot {
    pub fn capture(dataset: ResolvedDataset) -> Self {
        Self {
            dataset,
            captured_at: Utc::now(),
        }
    }
}
