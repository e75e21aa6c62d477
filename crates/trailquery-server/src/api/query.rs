// ABOUTME: Natural-language query handler driving the orchestration loop for one request.
// ABOUTME: POST /query returns a FinalAnswer, or 500 when the model is unavailable or any step fails.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::app_state::SharedState;

/// Request body for a natural-language location query.
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub query: String,
}

/// POST /query - Answer a natural-language question about person locations.
pub async fn query_locations(
    State(state): State<SharedState>,
    Json(req): Json<LocationQuery>,
) -> impl IntoResponse {
    let model = match state.connector.connect() {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("language model unavailable: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    tracing::info!(query = %req.query, "received location query");

    match state.orchestrator(model).answer(&req.query).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => {
            tracing::error!("query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("Error processing query: {}", e) })),
            )
                .into_response()
        }
    }
}
