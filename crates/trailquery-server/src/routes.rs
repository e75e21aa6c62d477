// ABOUTME: Route definitions for the trailquery HTTP API.
// ABOUTME: Assembles all API routes into a single Axum Router with shared state, tracing, and CORS.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(api::info::service_info))
        .route("/health", get(health))
        .route("/persons", get(api::persons::list_persons))
        .route("/query", post(api::query::query_locations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the map front-end. Origins that are not valid header values are
/// skipped, and so is `*`, which cannot be combined with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| {
            if o.as_str() == "*" {
                tracing::warn!("wildcard CORS origin is not supported with credentials, ignoring");
                return false;
            }
            true
        })
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
