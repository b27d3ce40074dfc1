//! Synthetic demo data for blocks without a usable live source.
//!
//! Output is shaped like a real fetch: one row per day for a date dimension,
//! one per week or month for coarser buckets, a handful of named entities
//! otherwise, and a single row without a dimension. Values are seeded from
//! the block id so the same block renders the same demo numbers each time.

use super::shaping::shape_rows;
use crate::catalog::{standard_ids, MetricCatalog};
use crate::comparison::previous_window;
use crate::models::{
    BlockSpec, CanonicalRow, DateWindow, DimensionId, Provenance, ResolvedDataset, Scope,
    SortOrder, TimeBucket,
};
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

const DEVICE_VALUES: [&str; 3] = ["MOBILE", "DESKTOP", "TABLET"];

#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    catalog: Arc<MetricCatalog>,
    entity_count: usize,
}

impl SyntheticGenerator {
    pub fn new(catalog: Arc<MetricCatalog>, entity_count: usize) -> Self {
        Self {
            catalog,
            entity_count: entity_count.max(1),
        }
    }

    /// Generate a dataset for `spec` over the scope's window, plus the prior
    /// window when comparison is enabled
    pub fn generate(&self, spec: &BlockSpec, scope: &Scope, seed_key: &str) -> ResolvedDataset {
        let current_rows = self.rows_for_window(spec, &scope.window, seed_key, "current");

        let comparison_rows = if spec.comparison.enabled {
            match previous_window(&scope.window, spec.comparison.kind) {
                Ok(prior) => self.rows_for_window(spec, &prior, seed_key, "comparison"),
                Err(_) => Vec::new(),
            }
        } else {
            Vec::new()
        };

        debug!(
            seed_key = %seed_key,
            current_rows = current_rows.len(),
            comparison_rows = comparison_rows.len(),
            "Generated synthetic dataset"
        );

        ResolvedDataset::new(current_rows, Provenance::Synthetic).with_comparison(comparison_rows)
    }

    fn rows_for_window(
        &self,
        spec: &BlockSpec,
        window: &DateWindow,
        seed_key: &str,
        period: &str,
    ) -> Vec<CanonicalRow> {
        let mut rows: Vec<CanonicalRow> = self
            .dimension_values(spec, window)
            .into_iter()
            .map(|dimension_value| {
                let seed = format!(
                    "{seed_key}|{period}|{}",
                    dimension_value.as_deref().unwrap_or("-")
                );
                self.synthetic_row(spec, dimension_value, xxh3_64(seed.as_bytes()))
            })
            .collect();

        let is_entity_dimension = spec
            .dimension
            .as_ref()
            .is_some_and(|dimension| dimension.time_bucket().is_none());
        if is_entity_dimension {
            if let Some(sort_field) = spec.sort_field() {
                rows.sort_by(|a, b| {
                    let ordering = a
                        .value(sort_field.as_str())
                        .partial_cmp(&b.value(sort_field.as_str()))
                        .unwrap_or(Ordering::Equal);
                    match spec.sort_order {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    }
                });
            }
        }

        shape_rows(&self.catalog, spec, rows)
    }

    fn dimension_values(&self, spec: &BlockSpec, window: &DateWindow) -> Vec<Option<String>> {
        let Some(dimension) = &spec.dimension else {
            return vec![None];
        };

        match dimension.time_bucket() {
            Some(TimeBucket::Day) => window
                .days()
                .map(|day| Some(day.format("%Y-%m-%d").to_string()))
                .collect(),
            Some(TimeBucket::Week) => bucket_labels(window, |day| {
                let offset = i64::from(day.weekday().num_days_from_monday());
                (day - chrono::Duration::days(offset))
                    .format("%Y-%m-%d")
                    .to_string()
            }),
            Some(TimeBucket::Month) => bucket_labels(window, |day| day.format("%Y-%m").to_string()),
            None => self.entity_labels(dimension, spec.limit as usize),
        }
    }

    fn entity_labels(&self, dimension: &DimensionId, limit: usize) -> Vec<Option<String>> {
        if dimension.as_str() == "segments.device" {
            return DEVICE_VALUES
                .iter()
                .take(limit)
                .map(|device| Some(device.to_string()))
                .collect();
        }

        let noun = entity_noun(dimension);
        (1..=self.entity_count.min(limit))
            .map(|index| Some(format!("{noun} {index}")))
            .collect()
    }

    fn synthetic_row(
        &self,
        spec: &BlockSpec,
        dimension_value: Option<String>,
        seed: u64,
    ) -> CanonicalRow {
        use standard_ids::*;

        let mut rng = StdRng::seed_from_u64(seed);
        let impressions = rng.gen_range(1_000.0..20_000.0_f64).round();
        let clicks = (impressions * rng.gen_range(0.01..0.08)).round();
        let cost_micros = (clicks * rng.gen_range(0.3..2.5) * 1_000_000.0).round();
        let conversions = (clicks * rng.gen_range(0.02..0.12)).round();
        let conversions_value =
            (conversions * rng.gen_range(20.0..120.0) * 100.0).round() / 100.0;
        let interactions = clicks + (impressions * rng.gen_range(0.0..0.01)).round();
        let video_views = (impressions * rng.gen_range(0.0..0.1)).round();

        let mut row = CanonicalRow::new(dimension_value)
            .with_value(IMPRESSIONS, impressions)
            .with_value(CLICKS, clicks)
            .with_value(COST_MICROS, cost_micros)
            .with_value(CONVERSIONS, conversions)
            .with_value(CONVERSIONS_VALUE, conversions_value)
            .with_value(INTERACTIONS, interactions)
            .with_value(VIDEO_VIEWS, video_views);

        for metric in &spec.metrics {
            if row.values.contains_key(metric) {
                continue;
            }
            let value = if self.catalog.is_computed(metric) {
                self.catalog.aggregate(metric, std::slice::from_ref(&row))
            } else {
                rng.gen_range(0.0..1_000.0_f64).round()
            };
            row.values.insert(metric.clone(), value);
        }
        row
    }
}

/// Distinct consecutive labels for the days of `window`
fn bucket_labels(
    window: &DateWindow,
    label: impl Fn(chrono::NaiveDate) -> String,
) -> Vec<Option<String>> {
    let mut labels: Vec<Option<String>> = Vec::new();
    for day in window.days() {
        let current = label(day);
        if labels.last().and_then(|last| last.as_deref()) != Some(current.as_str()) {
            labels.push(Some(current));
        }
    }
    labels
}

fn entity_noun(dimension: &DimensionId) -> &'static str {
    match dimension.namespace() {
        Some("campaign") => "Campaign",
        Some("ad_group") => "Ad group",
        Some("ad_group_ad") => "Ad",
        Some("ad_group_criterion") | Some("keyword") => "Keyword",
        Some("customer") => "Account",
        _ => "Item",
    }
}
