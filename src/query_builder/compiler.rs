use super::descriptor::{OrderClause, QueryDescriptor, QueryFilter, Resource};
use crate::catalog::MetricCatalog;
use crate::error::EngineResult;
use crate::models::{BlockSpec, DateWindow, Scope};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Compiles block specs into provider query descriptors
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    catalog: Arc<MetricCatalog>,
}

impl QueryCompiler {
    pub fn new(catalog: Arc<MetricCatalog>) -> Self {
        Self { catalog }
    }

    /// Compile `spec` against the scope's own window
    pub fn compile(&self, spec: &BlockSpec, scope: &Scope) -> EngineResult<QueryDescriptor> {
        self.compile_for_window(spec, scope, scope.window)
    }

    /// Compile `spec` against an explicit window, used for comparison fetches
    pub fn compile_for_window(
        &self,
        spec: &BlockSpec,
        scope: &Scope,
        window: DateWindow,
    ) -> EngineResult<QueryDescriptor> {
        spec.validate()?;
        window.ensure_valid()?;

        let fetch_metrics = self
            .catalog
            .resolve_for_fetch(&spec.metrics, spec.visualization);

        let mut seen = HashSet::new();
        let projection: Vec<String> = spec
            .dimension
            .iter()
            .map(|dimension| dimension.as_str())
            .chain(fetch_metrics.iter().map(|metric| metric.as_str()))
            .chain(spec.sort_field().map(|metric| metric.as_str()))
            .filter(|field| seen.insert(*field))
            .map(str::to_string)
            .collect();

        let order = spec.sort_field().map(|field| OrderClause {
            field: field.to_string(),
            direction: spec.sort_order,
        });

        let descriptor = QueryDescriptor {
            projection,
            resource: Resource::for_dimension(spec.dimension.as_ref()),
            filter: QueryFilter::new(window, scope.campaign_ids.iter().cloned()),
            order,
            limit: spec.limit,
        };

        debug!(
            resource = %descriptor.resource,
            fields = descriptor.projection.len(),
            window = %window,
            "Compiled block query"
        );

        Ok(descriptor)
    }
}
