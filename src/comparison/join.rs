use crate::models::{CanonicalRow, DimensionId, MetricId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDelta {
    pub current: f64,
    pub prior: f64,
    /// Zero when there is no baseline
    pub delta_pct: f64,
}

impl MetricDelta {
    pub fn new(current: f64, prior: f64) -> Self {
        Self {
            current,
            prior,
            delta_pct: delta_percent(current, prior),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRow {
    pub dimension_value: Option<String>,
    pub metrics: BTreeMap<MetricId, MetricDelta>,
}

/// `(current - prior) / prior * 100`, or `0` when `prior` is zero
pub fn delta_percent(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        0.0
    } else {
        (current - prior) / prior * 100.0
    }
}

/// Pair every current row with its comparison row and compute deltas.
///
/// Rows match on dimension value. Time-bucket dimensions never share values
/// across periods, so those pair by position instead. A current row without
/// a partner compares against zero.
pub fn join(
    current_rows: &[CanonicalRow],
    comparison_rows: &[CanonicalRow],
    dimension: Option<&DimensionId>,
) -> Vec<JoinedRow> {
    let positional = dimension.and_then(DimensionId::time_bucket).is_some();

    let mut by_value: HashMap<Option<&str>, &CanonicalRow> = HashMap::new();
    if !positional {
        for row in comparison_rows {
            by_value.entry(row.dimension_value.as_deref()).or_insert(row);
        }
    }

    current_rows
        .iter()
        .enumerate()
        .map(|(index, current)| {
            let prior = if positional {
                comparison_rows.get(index)
            } else {
                by_value.get(&current.dimension_value.as_deref()).copied()
            };
            join_row(current, prior)
        })
        .collect()
}

fn join_row(current: &CanonicalRow, prior: Option<&CanonicalRow>) -> JoinedRow {
    let metrics = current
        .values
        .iter()
        .map(|(metric, value)| {
            let prior_value = prior.map_or(0.0, |row| row.value(metric.as_str()));
            (metric.clone(), MetricDelta::new(*value, prior_value))
        })
        .collect();

    JoinedRow {
        dimension_value: current.dimension_value.clone(),
        metrics,
    }
}
