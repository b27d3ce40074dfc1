//! # Metric Catalog
//!
//! Lookup table from metric id to its definition. A metric is either `raw`
//! (summable as delivered by the provider) or `computed` from one level of raw
//! dependencies.
//!
//! Computed metrics are never averaged across rows. Aggregation sums every
//! dependency over the rows first and applies the metric's function to those
//! sums, which keeps ratios correct when row weights differ:
//!
//! ```rust
//! use block_engine::catalog::MetricCatalog;
//! use block_engine::models::CanonicalRow;
//!
//! let catalog = MetricCatalog::standard();
//! let rows = vec![
//!     CanonicalRow::new(None).with_value("metrics.clicks", 1.0).with_value("metrics.impressions", 10.0),
//!     CanonicalRow::new(None).with_value("metrics.clicks", 10.0).with_value("metrics.impressions", 1000.0),
//! ];
//! // (1 + 10) / (10 + 1000) * 100, not the mean of 10% and 1%
//! let ctr = catalog.aggregate(&"metrics.ctr".into(), &rows);
//! assert!((ctr - 1100.0 / 1010.0).abs() < 1e-9);
//! ```

mod definitions;

pub use definitions::{ratio, standard_ids};

use crate::error::{EngineError, EngineResult};
use crate::models::{CanonicalRow, MetricId, Visualization};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Pure function over summed dependency values, in declaration order
pub type AggregationFn = fn(&[f64]) -> f64;

#[derive(Debug, Clone)]
pub enum MetricDefinition {
    Raw,
    Computed {
        dependencies: Vec<MetricId>,
        aggregate: AggregationFn,
    },
}

impl MetricDefinition {
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }
}

static RAW: MetricDefinition = MetricDefinition::Raw;

#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    definitions: HashMap<MetricId, MetricDefinition>,
}

impl MetricCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the advertising metric set
    pub fn standard() -> Self {
        definitions::standard_catalog()
    }

    pub fn register_raw(&mut self, metric: impl Into<MetricId>) -> EngineResult<()> {
        let metric = metric.into();
        if let Some(MetricDefinition::Computed { .. }) = self.definitions.get(&metric) {
            return Err(EngineError::Configuration(format!(
                "metric {metric} is already registered as computed"
            )));
        }
        self.definitions.insert(metric, MetricDefinition::Raw);
        Ok(())
    }

    /// Register a computed metric. Dependencies must be raw, so resolution
    /// stays one level deep.
    pub fn register_computed<I, M>(
        &mut self,
        metric: impl Into<MetricId>,
        dependencies: I,
        aggregate: AggregationFn,
    ) -> EngineResult<()>
    where
        I: IntoIterator<Item = M>,
        M: Into<MetricId>,
    {
        let metric = metric.into();
        let dependencies: Vec<MetricId> = dependencies.into_iter().map(Into::into).collect();

        if dependencies.is_empty() {
            return Err(EngineError::Configuration(format!(
                "computed metric {metric} declares no dependencies"
            )));
        }
        if let Some(chained) = dependencies.iter().find(|dep| self.is_computed(dep)) {
            return Err(EngineError::Configuration(format!(
                "computed metric {metric} depends on computed metric {chained}"
            )));
        }
        if self.is_dependency(&metric) {
            return Err(EngineError::Configuration(format!(
                "metric {metric} is a dependency of another computed metric"
            )));
        }

        for dependency in &dependencies {
            self.definitions
                .entry(dependency.clone())
                .or_insert(MetricDefinition::Raw);
        }
        self.definitions.insert(
            metric,
            MetricDefinition::Computed {
                dependencies,
                aggregate,
            },
        );
        Ok(())
    }

    /// Definition of `metric`; unknown ids are treated as raw
    pub fn definition(&self, metric: &MetricId) -> &MetricDefinition {
        self.definitions.get(metric).unwrap_or(&RAW)
    }

    pub fn is_computed(&self, metric: &MetricId) -> bool {
        self.definition(metric).is_computed()
    }

    fn is_dependency(&self, metric: &MetricId) -> bool {
        self.definitions.values().any(|definition| match definition {
            MetricDefinition::Computed { dependencies, .. } => dependencies.contains(metric),
            MetricDefinition::Raw => false,
        })
    }

    /// Check the flat-resolution invariant over every registered definition
    pub fn validate(&self) -> EngineResult<()> {
        for (metric, definition) in &self.definitions {
            if let MetricDefinition::Computed { dependencies, .. } = definition {
                if dependencies.is_empty() {
                    return Err(EngineError::Configuration(format!(
                        "computed metric {metric} declares no dependencies"
                    )));
                }
                if let Some(chained) = dependencies.iter().find(|dep| self.is_computed(dep)) {
                    return Err(EngineError::Configuration(format!(
                        "computed metric {metric} depends on computed metric {chained}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Metrics to actually request from the provider.
    ///
    /// Non-aggregating visualizations get `metrics` back deduplicated. For
    /// aggregating ones every computed metric is swapped for its dependencies.
    pub fn resolve_for_fetch(
        &self,
        metrics: &[MetricId],
        visualization: Visualization,
    ) -> Vec<MetricId> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(metrics.len());
        let mut push = |metric: &MetricId| {
            if seen.insert(metric.clone()) {
                resolved.push(metric.clone());
            }
        };

        for metric in metrics {
            match self.definition(metric) {
                MetricDefinition::Computed { dependencies, .. } if visualization.aggregates() => {
                    dependencies.iter().for_each(&mut push);
                }
                _ => push(metric),
            }
        }
        resolved
    }

    /// Aggregate `metric` over `rows`: a plain sum for raw metrics, the
    /// metric's function over summed dependencies for computed ones.
    pub fn aggregate(&self, metric: &MetricId, rows: &[CanonicalRow]) -> f64 {
        let sum = |id: &MetricId| rows.iter().map(|row| row.value(id.as_str())).sum::<f64>();

        match self.definition(metric) {
            MetricDefinition::Raw => sum(metric),
            MetricDefinition::Computed {
                dependencies,
                aggregate,
            } => {
                let totals: Vec<f64> = dependencies.iter().map(sum).collect();
                aggregate(&totals)
            }
        }
    }

    /// Collapse all rows into one total row carrying `metrics`
    pub fn aggregate_total(&self, metrics: &[MetricId], rows: &[CanonicalRow]) -> CanonicalRow {
        let values = metrics
            .iter()
            .map(|metric| (metric.clone(), self.aggregate(metric, rows)))
            .collect();
        CanonicalRow {
            dimension_value: None,
            values,
        }
    }

    /// Group rows by dimension value (first-seen order) and aggregate each group
    pub fn aggregate_by_dimension(
        &self,
        metrics: &[MetricId],
        rows: &[CanonicalRow],
    ) -> Vec<CanonicalRow> {
        let mut order: Vec<Option<String>> = Vec::new();
        let mut groups: HashMap<Option<String>, Vec<CanonicalRow>> = HashMap::new();

        for row in rows {
            let group = groups.entry(row.dimension_value.clone()).or_insert_with(|| {
                order.push(row.dimension_value.clone());
                Vec::new()
            });
            group.push(row.clone());
        }

        order
            .into_iter()
            .map(|key| {
                let group = groups.remove(&key).unwrap_or_default();
                let values: BTreeMap<MetricId, f64> = metrics
                    .iter()
                    .map(|metric| (metric.clone(), self.aggregate(metric, &group)))
                    .collect();
                CanonicalRow {
                    dimension_value: key,
                    values,
                }
            })
            .collect()
    }
}
