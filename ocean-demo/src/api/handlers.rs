//! HTTP request handlers
//!
//! Thin adapters from JSON requests onto the playback engine, the shared
//! conversation and selection stores, the catalog and the responder.

use crate::api::server::AppContext;
use crate::catalog::{BoundingBox, EntityFilter, EntityList, Float, ProfileSeries};
use crate::conversation::QUICK_PROMPTS;
use crate::error::Error;
use crate::playback::PlayerStatus;
use crate::responder::{QueryRequest, QueryResponse};
use crate::scenario::Scenario;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use ocean_common::events::{ChangeSource, MessageInfo};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Floats returned by `/floats/nearest` when `n` is absent
const DEFAULT_NEAREST: usize = 5;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct ScenarioListResponse {
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    scenario_id: String,
    generation: u64,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    messages: Vec<MessageInfo>,
    quick_prompts: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionBody {
    entity_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    entity_ids: Vec<String>,
}

/// Query-string form of `EntityFilter`
///
/// The bounding box applies only when all four edges are given;
/// `params` is comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct FloatsQuery {
    west: Option<f64>,
    south: Option<f64>,
    east: Option<f64>,
    north: Option<f64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    params: Option<String>,
}

impl FloatsQuery {
    fn into_filter(self) -> Result<Option<EntityFilter>, Error> {
        let bbox = match (self.west, self.south, self.east, self.north) {
            (Some(west), Some(south), Some(east), Some(north)) => {
                if south > north {
                    return Err(Error::BadRequest(format!(
                        "south ({}) is above north ({})",
                        south, north
                    )));
                }
                Some(BoundingBox {
                    west,
                    south,
                    east,
                    north,
                })
            }
            (None, None, None, None) => None,
            _ => {
                return Err(Error::BadRequest(
                    "bounding box needs west, south, east and north".to_string(),
                ))
            }
        };

        let params = self
            .params
            .map(|p| {
                p.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let filter = EntityFilter {
            bbox,
            start: self.start,
            end: self.end,
            params,
        };
        Ok((!filter.is_empty()).then_some(filter))
    }
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    lat: f64,
    lon: f64,
    n: Option<usize>,
}

fn api_error(e: Error) -> ApiError {
    let status = match &e {
        Error::EntityNotFound(_) | Error::ScenarioNotFound(_) => StatusCode::NOT_FOUND,
        Error::Common(ocean_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) | Error::InvalidScenario(_) => StatusCode::BAD_REQUEST,
        Error::Common(ocean_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("Request failed: {}", e);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "ocean-demo".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Scenario Playback Endpoints
// ============================================================================

/// GET /scenarios - Built-in scenario library
pub async fn list_scenarios(State(ctx): State<AppContext>) -> Json<ScenarioListResponse> {
    let scenarios = ctx
        .player
        .library()
        .list()
        .iter()
        .map(|s| s.as_ref().clone())
        .collect();
    Json(ScenarioListResponse { scenarios })
}

/// POST /scenarios/:scenario_id/start - Start (or restart) a scenario
pub async fn start_scenario(
    State(ctx): State<AppContext>,
    Path(scenario_id): Path<String>,
) -> ApiResult<StartResponse> {
    let generation = ctx
        .player
        .start_by_id(&scenario_id)
        .await
        .map_err(api_error)?;
    Ok(Json(StartResponse {
        scenario_id,
        generation,
    }))
}

/// POST /playback/stop - Stop the running scenario, if any
pub async fn stop_playback(State(ctx): State<AppContext>) -> Json<StopResponse> {
    Json(StopResponse {
        stopped: ctx.player.stop().await,
    })
}

/// GET /playback/status - Engine state
pub async fn playback_status(State(ctx): State<AppContext>) -> Json<PlayerStatus> {
    Json(ctx.player.status().await)
}

// ============================================================================
// Conversation Endpoints
// ============================================================================

/// GET /conversation - Transcript and quick prompts
pub async fn get_conversation(State(ctx): State<AppContext>) -> Json<ConversationResponse> {
    Json(ConversationResponse {
        messages: ctx.state.conversation.messages().await,
        quick_prompts: QUICK_PROMPTS.to_vec(),
    })
}

/// POST /conversation/messages - Submit user text; the reply follows later
pub async fn post_message(
    State(ctx): State<AppContext>,
    Json(request): Json<MessageRequest>,
) -> Result<(StatusCode, Json<MessageInfo>), ApiError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(api_error(Error::BadRequest(
            "message content must not be empty".to_string(),
        )));
    }
    let message = ctx.chat.submit(content).await;
    Ok((StatusCode::ACCEPTED, Json(message)))
}

/// POST /conversation/reset - Clear the transcript
pub async fn reset_conversation(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.state.conversation.reset().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Selection Endpoints
// ============================================================================

/// GET /selection - Currently inspected float
pub async fn get_selection(State(ctx): State<AppContext>) -> Json<SelectionBody> {
    Json(SelectionBody {
        entity_id: ctx.state.selection.current().await,
    })
}

/// POST /selection - User selection; `null` clears
///
/// Applies immediately, even while a scenario is running.
pub async fn set_selection(
    State(ctx): State<AppContext>,
    Json(body): Json<SelectionBody>,
) -> ApiResult<SelectionBody> {
    if let Some(id) = &body.entity_id {
        if !ctx.catalog.contains(id) {
            return Err(api_error(Error::EntityNotFound(id.clone())));
        }
    }

    ctx.state
        .selection
        .select(body.entity_id.clone(), ChangeSource::User)
        .await;
    info!("User selected {:?}", body.entity_id);
    Ok(Json(body))
}

/// GET /highlights - Viewer highlight set
pub async fn get_highlights(State(ctx): State<AppContext>) -> Json<HighlightResponse> {
    Json(HighlightResponse {
        entity_ids: ctx.state.selection.highlighted().await,
    })
}

// ============================================================================
// Catalog and Responder Endpoints
// ============================================================================

/// GET /floats - Catalog listing with optional filter
pub async fn list_floats(
    State(ctx): State<AppContext>,
    Query(query): Query<FloatsQuery>,
) -> ApiResult<EntityList> {
    let filter = query.into_filter().map_err(api_error)?;
    let list = ctx
        .catalog
        .list_entities(filter.as_ref())
        .await
        .map_err(api_error)?;
    Ok(Json(list))
}

/// GET /floats/nearest?lat=..&lon=..&n=.. - Floats by distance
pub async fn nearest_floats(
    State(ctx): State<AppContext>,
    Query(query): Query<NearestQuery>,
) -> ApiResult<Vec<Float>> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(api_error(Error::BadRequest(format!(
            "coordinates out of range: {}, {}",
            query.lat, query.lon
        ))));
    }
    let floats = ctx
        .catalog
        .nearest(query.lat, query.lon, query.n.unwrap_or(DEFAULT_NEAREST))
        .await
        .map_err(api_error)?;
    Ok(Json(floats))
}

/// GET /floats/:float_id/profile - Latest profile of one float
pub async fn get_profile(
    State(ctx): State<AppContext>,
    Path(float_id): Path<String>,
) -> ApiResult<ProfileSeries> {
    let profile = ctx.catalog.get_profile(&float_id).await.map_err(api_error)?;
    Ok(Json(profile))
}

/// POST /query - Ask the responder directly (no transcript change)
pub async fn query(
    State(ctx): State<AppContext>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    if request.query.trim().is_empty() {
        return Err(api_error(Error::BadRequest("query must not be empty".to_string())));
    }
    let response = ctx.responder.query(&request).await.map_err(api_error)?;
    Ok(Json(response))
}
