//! # Comparison Periods
//!
//! Derives the prior window for a comparison mode and joins current rows
//! against comparison rows into per-metric deltas.

pub mod join;
pub mod window;

pub use join::{delta_percent, join, JoinedRow, MetricDelta};
pub use window::previous_window;
