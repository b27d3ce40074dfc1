use crate::catalog::MetricCatalog;
use crate::models::{BlockSpec, CanonicalRow, MetricId, Visualization};
use std::collections::HashSet;

/// Bring normalized rows into the shape the block displays.
///
/// Aggregating visualizations collapse rows (one total for a scorecard, one
/// per dimension value for a pie) and recompute computed metrics from the
/// summed dependencies. Other visualizations keep their rows and only drop
/// fields the block did not ask for.
pub fn shape_rows(
    catalog: &MetricCatalog,
    spec: &BlockSpec,
    rows: Vec<CanonicalRow>,
) -> Vec<CanonicalRow> {
    let metrics = spec.distinct_metrics();

    match spec.visualization {
        Visualization::Pie if spec.dimension.is_some() => {
            catalog.aggregate_by_dimension(&metrics, &rows)
        }
        Visualization::Pie | Visualization::Scorecard => {
            vec![catalog.aggregate_total(&metrics, &rows)]
        }
        Visualization::Table | Visualization::Bar | Visualization::Line => {
            let wanted: HashSet<&MetricId> = metrics.iter().collect();
            rows.into_iter()
                .map(|mut row| {
                    row.values.retain(|metric, _| wanted.contains(metric));
                    row
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CanonicalRow> {
        vec![
            CanonicalRow::new(Some("a".into()))
                .with_value("metrics.clicks", 10.0)
                .with_value("metrics.impressions", 100.0),
            CanonicalRow::new(Some("b".into()))
                .with_value("metrics.clicks", 30.0)
                .with_value("metrics.impressions", 3000.0),
        ]
    }

    #[test]
    fn test_scorecard_collapses_to_single_total() {
        let spec = BlockSpec::new(["metrics.ctr", "metrics.clicks"], Visualization::Scorecard)
            .with_dimension("campaign.name");
        let shaped = shape_rows(&MetricCatalog::standard(), &spec, rows());

        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].dimension_value, None);
        assert_eq!(shaped[0].value("metrics.clicks"), 40.0);
        assert!((shaped[0].value("metrics.ctr") - 40.0 / 3100.0 * 100.0).abs() < 1e-9);
        assert!(!shaped[0].values.contains_key("metrics.impressions"));
    }

    #[test]
    fn test_pie_groups_by_dimension() {
        let spec =
            BlockSpec::new(["metrics.ctr"], Visualization::Pie).with_dimension("campaign.name");
        let shaped = shape_rows(&MetricCatalog::standard(), &spec, rows());

        assert_eq!(shaped.len(), 2);
        assert!((shaped[1].value("metrics.ctr") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_keeps_rows_and_drops_extra_fields() {
        let spec = BlockSpec::new(["metrics.clicks"], Visualization::Table)
            .with_dimension("campaign.name");
        let shaped = shape_rows(&MetricCatalog::standard(), &spec, rows());

        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].values.len(), 1);
    }
}
