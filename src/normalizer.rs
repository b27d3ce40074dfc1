//! # Row Normalizer
//!
//! Flattens nested provider rows into [`CanonicalRow`]s keyed by metric id.
//! Each field id is a dotted path (`campaign.name`, `metrics.cost_micros`)
//! walked through the row object. Segments match either as written or in
//! camelCase, since providers serialize `cost_micros` as `costMicros`.
//!
//! No aggregation happens here; one provider row yields one canonical row.

use crate::catalog::MetricCatalog;
use crate::models::{BlockSpec, CanonicalRow, DimensionId, MetricId};
use serde_json::Value;

/// Normalize provider rows for `spec`, extracting the metrics the catalog
/// says were requested for its visualization.
pub fn normalize(
    provider_rows: &[Value],
    spec: &BlockSpec,
    catalog: &MetricCatalog,
) -> Vec<CanonicalRow> {
    let metrics = catalog.resolve_for_fetch(&spec.metrics, spec.visualization);
    normalize_fields(provider_rows, spec.dimension.as_ref(), &metrics)
}

/// Normalize provider rows against an explicit metric list
pub fn normalize_fields(
    provider_rows: &[Value],
    dimension: Option<&DimensionId>,
    metrics: &[MetricId],
) -> Vec<CanonicalRow> {
    provider_rows
        .iter()
        .map(|row| CanonicalRow {
            dimension_value: dimension
                .and_then(|dimension| lookup_path(row, dimension.as_str()))
                .and_then(dimension_text),
            values: metrics
                .iter()
                .map(|metric| {
                    let value = lookup_path(row, metric.as_str())
                        .map(metric_number)
                        .unwrap_or(0.0);
                    (metric.clone(), value)
                })
                .collect(),
        })
        .collect()
}

/// Walk a dotted path through nested objects
pub fn lookup_path<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |node, segment| {
        let object = node.as_object()?;
        object
            .get(segment)
            .or_else(|| object.get(&to_camel_case(segment)))
    })
}

fn to_camel_case(segment: &str) -> String {
    let mut camel = String::with_capacity(segment.len());
    let mut upper_next = false;
    for c in segment.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            camel.extend(c.to_uppercase());
            upper_next = false;
        } else {
            camel.push(c);
        }
    }
    camel
}

fn dimension_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

/// Providers send int64 counters as strings; anything unparseable is zero
fn metric_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
