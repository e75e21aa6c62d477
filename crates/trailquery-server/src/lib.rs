// ABOUTME: HTTP server for trailquery, answering natural-language location questions over REST.
// ABOUTME: Uses Axum with shared state holding the record store, query engine, and model connector.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, ServerConfig};
pub use routes::{cors_layer, create_router};
