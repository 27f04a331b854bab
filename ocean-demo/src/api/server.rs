//! HTTP server setup and routing
//!
//! Sets up the Axum router for the control endpoints and the SSE stream.

use crate::catalog::EntityCatalog;
use crate::conversation::ChatService;
use crate::error::{Error, Result};
use crate::playback::ScenarioPlayer;
use crate::responder::QueryResponder;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub player: Arc<ScenarioPlayer>,
    pub chat: ChatService,
    pub catalog: Arc<dyn EntityCatalog>,
    pub responder: Arc<dyn QueryResponder>,
}

/// Build the application router
pub fn build_router(ctx: AppContext) -> Router {
    use super::{handlers, sse};

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))

        // Scenario playback
        .route("/scenarios", get(handlers::list_scenarios))
        .route("/scenarios/:scenario_id/start", post(handlers::start_scenario))
        .route("/playback/stop", post(handlers::stop_playback))
        .route("/playback/status", get(handlers::playback_status))

        // Conversation
        .route("/conversation", get(handlers::get_conversation))
        .route("/conversation/messages", post(handlers::post_message))
        .route("/conversation/reset", post(handlers::reset_conversation))

        // Selection and highlights
        .route(
            "/selection",
            get(handlers::get_selection).post(handlers::set_selection),
        )
        .route("/highlights", get(handlers::get_highlights))

        // Catalog and responder
        .route("/floats", get(handlers::list_floats))
        .route("/floats/nearest", get(handlers::nearest_floats))
        .route("/floats/:float_id/profile", get(handlers::get_profile))
        .route("/query", post(handlers::query))

        // SSE event stream
        .route("/events", get(sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local front ends
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(addr: SocketAddr, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ctx);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
