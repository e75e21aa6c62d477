// ABOUTME: Person listing handler.
// ABOUTME: GET /persons returns the sorted identifiers of every person with a record file.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use trailquery_core::PersonId;

use crate::app_state::SharedState;

#[derive(Debug, Serialize)]
pub struct PersonsResponse {
    pub persons: Vec<PersonId>,
}

/// GET /persons - List available persons.
pub async fn list_persons(State(state): State<SharedState>) -> Json<PersonsResponse> {
    Json(PersonsResponse {
        persons: state.store().list_persons(),
    })
}
