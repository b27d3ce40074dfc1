//! Shared mocks and fixtures for integration tests

#![allow(dead_code)]

pub mod mock_executor;
pub mod mock_narrative;
pub mod strategies;

pub use mock_executor::*;
pub use mock_narrative::*;

use block_engine::models::{BlockSpec, DateWindow, Scope, Visualization};
use serde_json::{json, Value};

pub const ACCOUNT_ID: &str = "123-456-7890";

pub fn window(start: &str, end: &str) -> DateWindow {
    DateWindow::parse(start, end).unwrap()
}

pub fn march_scope() -> Scope {
    Scope::new(ACCOUNT_ID, window("2024-03-01", "2024-03-10"))
}

pub fn daily_clicks_spec() -> BlockSpec {
    BlockSpec::new(["metrics.clicks", "metrics.ctr"], Visualization::Line)
        .with_dimension("segments.date")
}

/// Provider-shaped daily rows, camelCase as providers deliver them
pub fn daily_provider_rows(days: &[(&str, u64, u64)]) -> Vec<Value> {
    days.iter()
        .map(|(date, clicks, impressions)| {
            json!({
                "segments": { "date": date },
                "metrics": {
                    "clicks": clicks,
                    "impressions": impressions,
                    "ctr": *clicks as f64 / *impressions as f64 * 100.0,
                    "costMicros": clicks * 500_000,
                }
            })
        })
        .collect()
}
