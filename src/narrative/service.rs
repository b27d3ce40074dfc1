use crate::error::EngineResult;
use crate::models::{CanonicalRow, DateWindow, DimensionId, MetricId, Visualization};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Everything the narrative service needs to describe one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    pub title: String,
    pub visualization: Visualization,
    pub metrics: Vec<MetricId>,
    pub dimension: Option<DimensionId>,
    pub period: DateWindow,
    pub current_data: Vec<CanonicalRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_data: Option<Vec<CanonicalRow>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    pub analysis: String,
}

/// External text-generation capability
#[async_trait]
pub trait NarrativeService: Send + Sync + Debug {
    async fn generate(&self, request: NarrativeRequest) -> EngineResult<NarrativeResponse>;
}
