use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

/// Row limit applied when a block does not declare one
pub const DEFAULT_LIMIT: u32 = 10;

/// Identifier of a metric field, e.g. `metrics.clicks`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MetricId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for MetricId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time granularity of a date-like dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Day,
    Week,
    Month,
}

/// Identifier of a grouping field, e.g. `campaign.name` or `segments.date`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionId(String);

impl DimensionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace prefix before the first `.`, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('.').map(|(namespace, _)| namespace)
    }

    /// The time bucket this dimension groups by, if it is a date segment
    pub fn time_bucket(&self) -> Option<TimeBucket> {
        match self.0.as_str() {
            "segments.date" => Some(TimeBucket::Day),
            "segments.week" => Some(TimeBucket::Week),
            "segments.month" => Some(TimeBucket::Month),
            _ => None,
        }
    }
}

impl From<&str> for DimensionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DimensionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visualization {
    Table,
    Bar,
    Line,
    Pie,
    Scorecard,
}

impl Visualization {
    /// Whether rows are summed over the period before display.
    ///
    /// Aggregating visualizations fetch the raw dependencies of computed
    /// metrics and recompute the ratio from the sums.
    pub fn aggregates(&self) -> bool {
        matches!(self, Self::Scorecard | Self::Pie)
    }
}

impl fmt::Display for Visualization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Bar => write!(f, "bar"),
            Self::Line => write!(f, "line"),
            Self::Pie => write!(f, "pie"),
            Self::Scorecard => write!(f, "scorecard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    #[default]
    PreviousPeriod,
    PreviousYear,
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousPeriod => write!(f, "previous_period"),
            Self::PreviousYear => write!(f, "previous_year"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ComparisonSettings {
    pub enabled: bool,
    #[serde(default)]
    pub kind: ComparisonKind,
}

impl ComparisonSettings {
    pub fn enabled(kind: ComparisonKind) -> Self {
        Self {
            enabled: true,
            kind,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Declarative description of one analytics block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSpec {
    pub metrics: Vec<MetricId>,
    #[serde(default)]
    pub dimension: Option<DimensionId>,
    pub visualization: Visualization,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub sort_by: Option<MetricId>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub comparison: ComparisonSettings,
}

impl BlockSpec {
    pub fn new<I, M>(metrics: I, visualization: Visualization) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MetricId>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            dimension: None,
            visualization,
            limit: DEFAULT_LIMIT,
            sort_by: None,
            sort_order: SortOrder::default(),
            comparison: ComparisonSettings::default(),
        }
    }

    pub fn with_dimension(mut self, dimension: impl Into<DimensionId>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn sorted_by(mut self, metric: impl Into<MetricId>, order: SortOrder) -> Self {
        self.sort_by = Some(metric.into());
        self.sort_order = order;
        self
    }

    pub fn with_comparison(mut self, kind: ComparisonKind) -> Self {
        self.comparison = ComparisonSettings::enabled(kind);
        self
    }

    /// Field used for ordering; falls back to the first metric
    pub fn sort_field(&self) -> Option<&MetricId> {
        self.sort_by.as_ref().or_else(|| self.metrics.first())
    }

    /// Metrics with duplicates removed, first occurrence wins
    pub fn distinct_metrics(&self) -> Vec<MetricId> {
        let mut seen = HashSet::new();
        self.metrics
            .iter()
            .filter(|metric| seen.insert(metric.as_str()))
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.metrics.is_empty() {
            return Err(EngineError::invalid_spec(
                "block must declare at least one metric",
            ));
        }
        if self.limit == 0 {
            return Err(EngineError::invalid_spec("limit must be positive"));
        }
        Ok(())
    }
}
