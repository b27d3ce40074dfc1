use block_engine::models::{CanonicalRow, DateWindow};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

/// Rows with positive impressions and clicks never above impressions
pub fn weighted_rows_strategy() -> impl Strategy<Value = Vec<CanonicalRow>> {
    prop::collection::vec((1u32..100_000, 0.0f64..=1.0), 1..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(impressions, click_share)| {
                let impressions = f64::from(impressions);
                CanonicalRow::new(None)
                    .with_value("metrics.impressions", impressions)
                    .with_value("metrics.clicks", (impressions * click_share).round())
            })
            .collect()
    })
}

/// Valid windows of 1 to 400 days within 2020..2030
pub fn window_strategy() -> impl Strategy<Value = DateWindow> {
    (0i64..3_650, 0i64..400).prop_map(|(offset, length)| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let start = base + Duration::days(offset);
        DateWindow::new(start, start + Duration::days(length))
    })
}
