#![allow(clippy::doc_markdown)] // Allow technical terms like GAQL, xxh3 in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Analytics Block Engine
//!
//! Resolution engine for declarative analytics blocks.
//!
//! ## Overview
//!
//! A report is a list of blocks. Each block names the metrics it shows, an
//! optional dimension to group by, a visualization and comparison settings.
//! The engine turns that description plus a scope (account, campaigns, date
//! window) into a dataset, honestly tagged with where the data came from.
//!
//! ## Architecture
//!
//! - **Metric catalog**: raw and computed metrics, with ratio-of-sums
//!   aggregation for computed ones
//! - **Query compiler**: block spec to provider-agnostic query descriptor
//! - **Row normalizer**: nested provider rows to flat canonical rows
//! - **Comparison**: prior window calculation and delta joins
//! - **Resolution pipeline**: live fetch, then snapshot, then synthetic data
//! - **Narrative scheduler**: bounded bulk generation of block analysis text
//!
//! ## Module Organization
//!
//! - [`catalog`] - Metric definitions and aggregation
//! - [`query_builder`] - Query compilation
//! - [`normalizer`] - Provider row flattening
//! - [`comparison`] - Prior windows and deltas
//! - [`resolution`] - Tiered data resolution
//! - [`narrative`] - Narrative scheduling and staleness
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use block_engine::config::EngineConfig;
//! use block_engine::models::{BlockSpec, DateWindow, Scope, Visualization};
//! use block_engine::resolution::{
//!     BlockResolver, InMemorySnapshotStore, ResolutionContext, UnavailableExecutor,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let resolver = BlockResolver::new(
//!     Arc::new(UnavailableExecutor),
//!     Arc::new(InMemorySnapshotStore::new()),
//!     &config,
//! );
//!
//! let spec = BlockSpec::new(["metrics.clicks", "metrics.ctr"], Visualization::Line)
//!     .with_dimension("segments.date");
//! let scope = Scope::new("123-456-7890", DateWindow::parse("2024-03-01", "2024-03-31")?);
//!
//! let dataset = resolver
//!     .resolve_block(&spec, &scope, &ResolutionContext::authenticated("block-1", "report-1"))
//!     .await?;
//! println!("{} rows from {}", dataset.current_rows.len(), dataset.provenance);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod comparison;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod normalizer;
pub mod query_builder;
pub mod resilience;
pub mod resolution;

pub use catalog::{MetricCatalog, MetricDefinition};
pub use config::{ConfigLoader, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use models::{BlockSpec, CanonicalRow, DateWindow, Provenance, ResolvedDataset, Scope};
pub use narrative::{NarrativeScheduler, NarrativeService, NarrativeSink};
pub use query_builder::{QueryCompiler, QueryDescriptor};
pub use resolution::{BlockResolver, ResolutionContext, ResolutionTrigger};
