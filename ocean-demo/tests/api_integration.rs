//! Integration tests for the ocean-demo HTTP API
//!
//! Tests cover:
//! - Health and scenario listing
//! - Scenario start/stop/status round trips
//! - Conversation submit and reset
//! - User selection (including unknown floats)
//! - Catalog listing, nearest, profile, and direct queries

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ocean_demo::api::{build_router, AppContext};
use ocean_demo::catalog::{CatalogLatency, EntityCatalog, MockCatalog};
use ocean_demo::conversation::ChatService;
use ocean_demo::playback::ScenarioPlayer;
use ocean_demo::responder::{CannedResponder, QueryResponder};
use ocean_demo::scenario::ScenarioLibrary;
use ocean_demo::state::SharedState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: app with zero simulated latency
fn setup_app() -> (Router, AppContext) {
    let state = Arc::new(SharedState::new());
    let catalog = Arc::new(MockCatalog::demo(CatalogLatency::none()));
    let responder: Arc<dyn QueryResponder> = Arc::new(CannedResponder::new(catalog.clone(), 0));
    let chat = ChatService::new(
        state.conversation.clone(),
        responder.clone(),
        state.events.clone(),
        0,
    );
    let player = Arc::new(ScenarioPlayer::new(
        state.clone(),
        Arc::new(ScenarioLibrary::builtin().unwrap()),
        Duration::from_secs(1),
    ));

    let ctx = AppContext {
        state,
        player,
        chat,
        catalog: catalog as Arc<dyn EntityCatalog>,
        responder,
    };
    (build_router(ctx.clone()), ctx)
}

/// Test helper: request without a body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: request with a JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Health and Scenarios
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_app();
    let (status, body) = send(&app, test_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "ocean-demo");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_list_scenarios() {
    let (app, _) = setup_app();
    let (status, body) = send(&app, test_request("GET", "/scenarios")).await;

    assert_eq!(status, StatusCode::OK);
    let scenarios = body["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 3);
    assert_eq!(scenarios[0]["id"], "equatorial-salinity");
    assert_eq!(scenarios[0]["steps"][1]["action"], "focus-viewer");
    assert_eq!(scenarios[0]["steps"][1]["target"], "R12345");
}

// =============================================================================
// Playback
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_status_stop() {
    let (app, ctx) = setup_app();

    let (status, body) = send(&app, test_request("POST", "/scenarios/pacific-depth/start")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scenario_id"], "pacific-depth");

    let (_, body) = send(&app, test_request("GET", "/playback/status")).await;
    assert_eq!(body["state"], "running");
    assert_eq!(body["step_index"], 0);
    assert_eq!(body["action"], "chat");

    let (_, body) = send(&app, test_request("POST", "/playback/stop")).await;
    assert_eq!(body["stopped"], true);
    assert!(ctx.player.status().await.is_idle());

    let (_, body) = send(&app, test_request("POST", "/playback/stop")).await;
    assert_eq!(body["stopped"], false);

    let (_, body) = send(&app, test_request("GET", "/playback/status")).await;
    assert_eq!(body["state"], "idle");
}

#[tokio::test]
async fn test_start_unknown_scenario_is_not_found() {
    let (app, _) = setup_app();
    let (status, body) = send(&app, test_request("POST", "/scenarios/arctic-ice/start")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["status"].as_str().unwrap().contains("arctic-ice"));
}

// =============================================================================
// Conversation
// =============================================================================

#[tokio::test]
async fn test_conversation_submit_and_reset() {
    let (app, ctx) = setup_app();

    let (status, body) = send(&app, test_request("GET", "/conversation")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["quick_prompts"].as_array().unwrap().len(), 4);

    let (status, body) = send(
        &app,
        json_request("POST", "/conversation/messages", json!({"content": "salinity?"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["role"], "user");
    assert_eq!(body["content"], "salinity?");

    let (status, _) = send(&app, test_request("POST", "/conversation/reset")).await;
    assert_eq!(status, StatusCode::OK);

    // Whatever the reply task does now, it may not land after the reset
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ctx.state.conversation.is_empty().await);
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (app, _) = setup_app();
    let (status, _) = send(
        &app,
        json_request("POST", "/conversation/messages", json!({"content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_user_selection_round_trip() {
    let (app, _) = setup_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/selection", json!({"entity_id": "R67890"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entity_id"], "R67890");

    let (_, body) = send(&app, test_request("GET", "/selection")).await;
    assert_eq!(body["entity_id"], "R67890");

    let (_, body) = send(&app, json_request("POST", "/selection", json!({"entity_id": null}))).await;
    assert!(body["entity_id"].is_null());
}

#[tokio::test]
async fn test_select_unknown_float_is_not_found() {
    let (app, ctx) = setup_app();
    let (status, _) = send(
        &app,
        json_request("POST", "/selection", json!({"entity_id": "R00000"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.state.selection.current().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_highlights_follow_scenario() {
    let (app, _) = setup_app();
    send(&app, test_request("POST", "/scenarios/equatorial-salinity/start")).await;

    // Highlight step runs at t=5
    tokio::time::sleep(Duration::from_millis(5500)).await;

    let (_, body) = send(&app, test_request("GET", "/highlights")).await;
    assert_eq!(body["entity_ids"], json!(["R12345", "R67890"]));
}

// =============================================================================
// Catalog and Query
// =============================================================================

#[tokio::test]
async fn test_list_floats_with_bbox() {
    let (app, _) = setup_app();

    let (_, body) = send(&app, test_request("GET", "/floats")).await;
    assert_eq!(body["count"], 3);

    let (status, body) = send(
        &app,
        test_request("GET", "/floats?west=30&south=-5&east=40&north=5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, _) = send(&app, test_request("GET", "/floats?west=30")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_floats_by_param() {
    let (app, _) = setup_app();
    let (_, body) = send(&app, test_request("GET", "/floats?params=oxygen")).await;

    assert_eq!(body["count"], 1);
    assert_eq!(body["entities"][0]["id"], "R12345");
}

#[tokio::test]
async fn test_nearest_floats() {
    let (app, _) = setup_app();
    let (status, body) = send(&app, test_request("GET", "/floats/nearest?lat=0&lon=36&n=2")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["R67890", "R12345"]);
}

#[tokio::test]
async fn test_profile_found_and_missing() {
    let (app, _) = setup_app();

    let (status, body) = send(&app, test_request("GET", "/floats/R12345/profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "R12345");
    assert!(!body["profile"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, test_request("GET", "/floats/R11223/profile")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_query_returns_directive() {
    let (app, ctx) = setup_app();
    let messages_before = ctx.state.conversation.len().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/query", json!({"query": "temperature near the equator"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["query_id"].as_str().unwrap().starts_with("q-"));
    assert_eq!(body["visualization"]["chart_instructions"]["x"], "temperature");
    assert!(body["confidence"].as_f64().unwrap() <= 1.0);

    // Direct queries leave the transcript alone
    assert_eq!(ctx.state.conversation.len().await, messages_before);
}
