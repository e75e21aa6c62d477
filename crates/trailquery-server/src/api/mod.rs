// ABOUTME: API module containing all HTTP handler functions for the trailquery REST API.
// ABOUTME: Organized into sub-modules for natural-language queries, person listing, and service info.

pub mod info;
pub mod persons;
pub mod query;
