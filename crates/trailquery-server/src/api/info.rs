// ABOUTME: Service metadata handler for the API root.
// ABOUTME: GET / describes the endpoints and suggests example queries for the persons currently available.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::collections::BTreeMap;
use trailquery_core::PersonId;

use crate::app_state::SharedState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub description: String,
    pub available_persons: Vec<PersonId>,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub single_person_examples: Vec<String>,
    pub multi_person_examples: Vec<String>,
    pub features: Vec<&'static str>,
}

/// GET / - Service metadata and example queries.
pub async fn service_info(State(state): State<SharedState>) -> Json<ServiceInfo> {
    let persons = state.store().list_persons();
    let persons_list = persons
        .iter()
        .map(PersonId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let (single_person_examples, multi_person_examples) = example_queries(&persons);

    Json(ServiceInfo {
        message: "Location Query API".to_string(),
        description: format!(
            "Query location data for people ({}) using natural language",
            persons_list
        ),
        available_persons: persons,
        endpoints: BTreeMap::from([
            ("/query", "POST - Submit natural language location queries"),
            ("/persons", "GET - Get list of available persons"),
            ("/health", "GET - Liveness check"),
        ]),
        single_person_examples,
        multi_person_examples,
        features: vec![
            "Single-person location queries",
            "Multi-person location comparisons",
            "Overlapping location detection",
            "Time-based location analysis",
            "Interactive map visualization",
        ],
    })
}

/// Example questions built from the first three available persons.
pub fn example_queries(persons: &[PersonId]) -> (Vec<String>, Vec<String>) {
    let mut single = Vec::new();
    let mut multi = Vec::new();

    let Some(first) = persons.first() else {
        return (single, multi);
    };
    single.push(format!("Where was {} between 8am and 11am?", first));
    single.push(format!("Where was {} at 3pm?", first));

    if let Some(second) = persons.get(1) {
        single.push(format!("What locations did {} visit throughout the day?", second));
        single.push(format!("Show me {}'s movement pattern in the afternoon", second));
        multi.push(format!("Where were {} and {} at 3pm?", first, second));
        multi.push(format!(
            "Were there any locations where {} and {} were together?",
            first, second
        ));
        multi.push(format!(
            "Show me the movement of {} and {} during the morning",
            first, second
        ));

        if let Some(third) = persons.get(2) {
            single.push(format!("Where was {} during lunch time?", third));
            multi.push(format!(
                "Compare the locations of {} and {} at noon",
                second, third
            ));
        }
    }

    (single, multi)
}
