// ABOUTME: Core domain for trailquery: location records, person record files, and query execution.
// ABOUTME: Exposes the record store, the jq filter engine capability, the query executor, and distance math.

pub mod distance;
pub mod engine;
pub mod executor;
pub mod record;
pub mod store;

pub use distance::{DistanceReport, GeoPoint, haversine_distance};
pub use engine::{EngineError, FilterEngine, JqEngine};
pub use executor::{MultiPersonOutcome, QueryExecutor};
pub use record::{Coordinate, LocationRecord, PersonId};
pub use store::RecordStore;
