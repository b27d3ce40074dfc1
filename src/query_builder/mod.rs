//! # Query Builder
//!
//! Turns a block spec and scope into a provider-neutral [`QueryDescriptor`]:
//! projection, inferred resource, date/campaign filter, order and limit.
//!
//! ## Key Components
//!
//! - [`compiler`] - `BlockSpec` + `Scope` → `QueryDescriptor`
//! - [`descriptor`] - descriptor types, resource inference and query rendering
//!
//! ## Example Usage
//!
//! ```rust
//! use block_engine::catalog::MetricCatalog;
//! use block_engine::models::{BlockSpec, DateWindow, Scope, Visualization};
//! use block_engine::query_builder::QueryCompiler;
//! use std::sync::Arc;
//!
//! let compiler = QueryCompiler::new(Arc::new(MetricCatalog::standard()));
//! let spec = BlockSpec::new(["metrics.clicks"], Visualization::Bar).with_dimension("campaign.name");
//! let scope = Scope::new("123", DateWindow::parse("2024-03-01", "2024-03-31").unwrap());
//!
//! let query = compiler.compile(&spec, &scope).unwrap();
//! assert!(query.render().starts_with("SELECT campaign.name, metrics.clicks FROM campaign"));
//! ```

pub mod compiler;
pub mod descriptor;

pub use compiler::QueryCompiler;
pub use descriptor::{
    OrderClause, QueryDescriptor, QueryFilter, Resource, CAMPAIGN_ID_FIELD, DATE_FIELD,
};
