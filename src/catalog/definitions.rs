//! Advertising metric definitions shipped with the engine

use super::{MetricCatalog, MetricDefinition};
use crate::models::MetricId;

/// Metric identifiers understood by the standard catalog
pub mod standard_ids {
    pub const IMPRESSIONS: &str = "metrics.impressions";
    pub const CLICKS: &str = "metrics.clicks";
    pub const COST_MICROS: &str = "metrics.cost_micros";
    pub const CONVERSIONS: &str = "metrics.conversions";
    pub const CONVERSIONS_VALUE: &str = "metrics.conversions_value";
    pub const VIDEO_VIEWS: &str = "metrics.video_views";
    pub const INTERACTIONS: &str = "metrics.interactions";

    pub const CTR: &str = "metrics.ctr";
    pub const AVERAGE_CPC: &str = "metrics.average_cpc";
    pub const AVERAGE_CPM: &str = "metrics.average_cpm";
    pub const COST_PER_CONVERSION: &str = "metrics.cost_per_conversion";
    pub const CONVERSION_RATE: &str = "metrics.conversion_rate";
    pub const ROAS: &str = "metrics.roas";
    pub const INTERACTION_RATE: &str = "metrics.interaction_rate";

    pub const RAW: [&str; 7] = [
        IMPRESSIONS,
        CLICKS,
        COST_MICROS,
        CONVERSIONS,
        CONVERSIONS_VALUE,
        VIDEO_VIEWS,
        INTERACTIONS,
    ];
}

const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// `numerator / denominator`, zero when there is no denominator
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn percentage(values: &[f64]) -> f64 {
    ratio(values[0], values[1]) * 100.0
}

fn quotient(values: &[f64]) -> f64 {
    ratio(values[0], values[1])
}

fn per_mille(values: &[f64]) -> f64 {
    ratio(values[0], values[1]) * 1000.0
}

fn return_on_spend(values: &[f64]) -> f64 {
    ratio(values[0], values[1] / MICROS_PER_UNIT)
}

pub(super) fn standard_catalog() -> MetricCatalog {
    use standard_ids::*;

    let mut catalog = MetricCatalog::new();
    let computed: [(&str, [&str; 2], super::AggregationFn); 7] = [
        (CTR, [CLICKS, IMPRESSIONS], percentage),
        (AVERAGE_CPC, [COST_MICROS, CLICKS], quotient),
        (AVERAGE_CPM, [COST_MICROS, IMPRESSIONS], per_mille),
        (COST_PER_CONVERSION, [COST_MICROS, CONVERSIONS], quotient),
        (CONVERSION_RATE, [CONVERSIONS, CLICKS], percentage),
        (ROAS, [CONVERSIONS_VALUE, COST_MICROS], return_on_spend),
        (INTERACTION_RATE, [INTERACTIONS, IMPRESSIONS], percentage),
    ];

    for metric in RAW {
        catalog
            .definitions
            .insert(MetricId::from(metric), MetricDefinition::Raw);
    }
    for (metric, dependencies, aggregate) in computed {
        catalog.definitions.insert(
            MetricId::from(metric),
            MetricDefinition::Computed {
                dependencies: dependencies.into_iter().map(MetricId::from).collect(),
                aggregate,
            },
        );
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::standard_ids::*;
    use super::*;
    use crate::models::CanonicalRow;

    #[test]
    fn test_standard_catalog_is_flat() {
        let catalog = MetricCatalog::standard();
        assert!(catalog.validate().is_ok());
        for metric in RAW {
            assert!(!catalog.is_computed(&MetricId::from(metric)));
        }
        assert!(catalog.is_computed(&MetricId::from(ROAS)));
    }

    #[test]
    fn test_roas_converts_micros() {
        let catalog = MetricCatalog::standard();
        let rows = vec![CanonicalRow::new(None)
            .with_value(CONVERSIONS_VALUE, 250.0)
            .with_value(COST_MICROS, 50_000_000.0)];
        assert_eq!(catalog.aggregate(&ROAS.into(), &rows), 5.0);
    }

    #[test]
    fn test_average_cpm() {
        let catalog = MetricCatalog::standard();
        let rows = vec![CanonicalRow::new(None)
            .with_value(COST_MICROS, 2_000_000.0)
            .with_value(IMPRESSIONS, 4000.0)];
        assert_eq!(catalog.aggregate(&AVERAGE_CPM.into(), &rows), 500_000.0);
    }

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 2.0), 2.5);
    }
}
