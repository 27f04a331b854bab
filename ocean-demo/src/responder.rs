//! Query responder
//!
//! Turns a free-text query into a match set, a visualization directive and a
//! natural-language answer. There is no language understanding here: the
//! canned responder matches the catalog against the request filter and
//! picks a chart axis from a keyword.

use crate::catalog::{EntityFilter, MockCatalog};
use crate::error::Result;
use async_trait::async_trait;
use ocean_common::time::millis_to_duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Confidence reported when at least one float matched
const MATCH_CONFIDENCE: f64 = 0.92;

/// Confidence reported for an empty match set
const NO_MATCH_CONFIDENCE: f64 = 0.1;

/// A free-text query with optional spatial/temporal restriction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub filter: Option<EntityFilter>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filter: None,
        }
    }
}

/// Axis instructions for the profile chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInstructions {
    pub x: String,
    pub y: String,
    pub y_inverted: bool,
}

/// Link from a matched float to its profile resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub float_id: String,
    pub profile_api: String,
}

/// Suggested visualization for the matched floats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationDirective {
    /// Suggested action for the front end (e.g. `visualize_profiles`)
    pub action: String,
    /// Chart type (`compare_profiles`, `single_profile`, `none`)
    #[serde(rename = "type")]
    pub kind: String,
    pub profiles: Vec<ProfileLink>,
    pub chart_instructions: ChartInstructions,
}

/// Answer to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub matched_ids: Vec<String>,
    pub visualization: VisualizationDirective,
    pub answer_text: String,
    /// Always within [0, 1]
    pub confidence: f64,
}

/// Answers free-text queries about the float catalog
#[async_trait]
pub trait QueryResponder: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;
}

/// Stub responder returning a canned answer over the mock catalog
pub struct CannedResponder {
    catalog: Arc<MockCatalog>,
    latency: Duration,
}

impl CannedResponder {
    pub fn new(catalog: Arc<MockCatalog>, latency_ms: u64) -> Self {
        Self {
            catalog,
            latency: millis_to_duration(latency_ms),
        }
    }

    /// Parameter plotted on the x axis, chosen from query keywords
    fn chart_parameter(query: &str) -> &'static str {
        let lower = query.to_lowercase();
        if lower.contains("temperature") {
            "temperature"
        } else {
            "salinity"
        }
    }
}

#[async_trait]
impl QueryResponder for CannedResponder {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let matched_ids: Vec<String> = self
            .catalog
            .floats()
            .iter()
            .filter(|f| request.filter.as_ref().map_or(true, |flt| flt.matches(f)))
            .map(|f| f.id.clone())
            .collect();

        let kind = match matched_ids.len() {
            0 => "none",
            1 => "single_profile",
            _ => "compare_profiles",
        };

        let profiles = matched_ids
            .iter()
            .map(|id| ProfileLink {
                float_id: id.clone(),
                profile_api: format!("/floats/{}/profile", id),
            })
            .collect();

        let (answer_text, confidence) = if matched_ids.is_empty() {
            (
                format!(
                    "I couldn't find any floats matching your query \"{}\". Try widening the region or time range.",
                    request.query
                ),
                NO_MATCH_CONFIDENCE,
            )
        } else {
            (
                format!(
                    "Found {} floats matching your query \"{}\". The data shows interesting patterns in the selected region.",
                    matched_ids.len(),
                    request.query
                ),
                MATCH_CONFIDENCE,
            )
        };

        let response = QueryResponse {
            query_id: format!("q-{}", Uuid::new_v4()),
            matched_ids,
            visualization: VisualizationDirective {
                action: "visualize_profiles".to_string(),
                kind: kind.to_string(),
                profiles,
                chart_instructions: ChartInstructions {
                    x: Self::chart_parameter(&request.query).to_string(),
                    y: "depth".to_string(),
                    y_inverted: true,
                },
            },
            answer_text,
            confidence,
        };

        debug!(
            "Answered query {} with {} matches (confidence {:.2})",
            response.query_id,
            response.matched_ids.len(),
            response.confidence
        );
        Ok(response)
    }
}
