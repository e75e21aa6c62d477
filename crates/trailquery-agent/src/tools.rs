// ABOUTME: Tool registry for LLM function calling: declarations, typed arguments, and dispatch.
// ABOUTME: A closed set of tool names maps to the query executor and the distance calculator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use trailquery_core::{DistanceReport, GeoPoint, MultiPersonOutcome, QueryExecutor, haversine_distance};

use crate::runtime::ToolCallRequest;

/// Every tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ExecuteJqQuery,
    CalculateDistance,
}

impl ToolName {
    pub const ALL: [ToolName; 2] = [ToolName::ExecuteJqQuery, ToolName::CalculateDistance];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ExecuteJqQuery => "execute_jq_query",
            ToolName::CalculateDistance => "calculate_distance_between_locations",
        }
    }

    /// Provider-neutral JSON schema declaration for this tool.
    pub fn definition(&self) -> Value {
        match self {
            ToolName::ExecuteJqQuery => execute_jq_query(),
            ToolName::CalculateDistance => calculate_distance_between_locations(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnsupportedTool(s.to_string()))
    }
}

/// Errors raised while resolving or running a tool call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unsupported tool: {0}")]
    UnsupportedTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: ToolName, message: String },
}

/// Arguments of `execute_jq_query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JqQueryArgs {
    pub persons: String,
    pub jq_filter: String,
    #[serde(default = "default_combine_results")]
    pub combine_results: bool,
}

fn default_combine_results() -> bool {
    true
}

/// Arguments of `calculate_distance_between_locations`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DistanceArgs {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

/// A tool call with its arguments checked against the tool's parameter types.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    ExecuteJqQuery(JqQueryArgs),
    CalculateDistance(DistanceArgs),
}

impl ToolCall {
    pub fn parse(request: &ToolCallRequest) -> Result<Self, ToolError> {
        let tool: ToolName = request.name.parse()?;
        let args = if request.args.is_null() {
            json!({})
        } else {
            request.args.clone()
        };
        let invalid = |e: serde_json::Error| ToolError::InvalidArguments {
            tool,
            message: e.to_string(),
        };

        match tool {
            ToolName::ExecuteJqQuery => serde_json::from_value(args)
                .map(ToolCall::ExecuteJqQuery)
                .map_err(invalid),
            ToolName::CalculateDistance => serde_json::from_value(args)
                .map(ToolCall::CalculateDistance)
                .map_err(invalid),
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::ExecuteJqQuery(_) => ToolName::ExecuteJqQuery,
            ToolCall::CalculateDistance(_) => ToolName::CalculateDistance,
        }
    }
}

/// Structured result of a tool call; its JSON shape depends on the tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Query(MultiPersonOutcome),
    Distance(DistanceReport),
}

/// Static mapping from tool name to implementation.
#[derive(Clone)]
pub struct ToolRegistry {
    executor: QueryExecutor,
}

impl ToolRegistry {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn definitions(&self) -> Vec<Value> {
        all_tool_definitions()
    }

    /// Resolve and run one model-requested tool call.
    pub async fn dispatch(&self, request: &ToolCallRequest) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::parse(request)?;
        tracing::info!(tool = %call.name(), "dispatching tool call");

        match call {
            ToolCall::ExecuteJqQuery(args) => {
                let outcome = self
                    .executor
                    .run_multi_person_query(&args.persons, &args.jq_filter, args.combine_results)
                    .await;
                tracing::debug!(
                    persons = %args.persons,
                    filter = %args.jq_filter,
                    count = outcome.count(),
                    "jq query tool finished"
                );
                Ok(ToolOutput::Query(outcome))
            }
            ToolCall::CalculateDistance(args) => Ok(ToolOutput::Distance(haversine_distance(
                GeoPoint::new(args.lat1, args.lon1),
                GeoPoint::new(args.lat2, args.lon2),
            ))),
        }
    }
}

/// Return the complete set of tool definitions the model can use.
/// These are provider-agnostic JSON schemas; each provider adapter
/// reformats them to match its API's tool specification.
pub fn all_tool_definitions() -> Vec<Value> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

/// Tool: run a jq filter over one or more persons' location files.
fn execute_jq_query() -> Value {
    json!({
        "name": "execute_jq_query",
        "description": "Execute a jq query on GPS location data for one or more persons. This flexible tool allows you to construct any jq filter to query the JSON location data. Each person's data is in a file named 'tlv_day_locations_personX.json' containing an array of location objects with fields: timestamp, latitude, longitude, altitude, horizontal_accuracy_meters, vertical_accuracy_meters, speed_mps, bearing_degrees, provider.",
        "parameters": {
            "type": "object",
            "properties": {
                "persons": {
                    "type": "string",
                    "description": "Comma-separated list of person identifiers (e.g., 'person1' or 'person1,person2'). Each person corresponds to a data file."
                },
                "jq_filter": {
                    "type": "string",
                    "description": "jq filter expression to apply to the location data. Examples:\n- '.' (all locations)\n- 'map(select(.timestamp >= \"2025-07-29T08:00:00Z\" and .timestamp <= \"2025-07-29T11:00:00Z\"))' (time range)\n- 'map(select(.timestamp | startswith(\"2025-07-29T15\")))' (specific hour)\n- 'unique_by(.latitude, .longitude)' (unique locations)\n- 'sort_by(.timestamp)' (sort by time)\n- 'map(select(.latitude > 32.0 and .latitude < 32.1))' (geographic bounds)"
                },
                "combine_results": {
                    "type": "boolean",
                    "description": "If true and multiple persons specified, combine all results into one array. If false, keep results separate by person. Default: true"
                }
            },
            "required": ["persons", "jq_filter"]
        }
    })
}

/// Tool: Haversine distance between two points.
fn calculate_distance_between_locations() -> Value {
    json!({
        "name": "calculate_distance_between_locations",
        "description": "Calculate the distance in meters between two GPS locations using the Haversine formula. Use this to determine if people were close to each other.",
        "parameters": {
            "type": "object",
            "properties": {
                "lat1": { "type": "number", "description": "Latitude of first location (decimal degrees)" },
                "lon1": { "type": "number", "description": "Longitude of first location (decimal degrees)" },
                "lat2": { "type": "number", "description": "Latitude of second location (decimal degrees)" },
                "lon2": { "type": "number", "description": "Longitude of second location (decimal degrees)" }
            },
            "required": ["lat1", "lon1", "lat2", "lon2"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedEngine;
    use std::sync::Arc;
    use tempfile::TempDir;
    use trailquery_core::RecordStore;

    fn registry_with(dir: &TempDir, persons: &[&str], engine: CannedEngine) -> ToolRegistry {
        for p in persons {
            std::fs::write(dir.path().join(format!("tlv_day_locations_{}.json", p)), "[]").unwrap();
        }
        let executor = QueryExecutor::new(RecordStore::new(dir.path()), Arc::new(engine));
        ToolRegistry::new(executor)
    }

    fn request(name: &str, args: Value) -> ToolCallRequest {
        ToolCallRequest {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn tool_definitions_are_valid_json() {
        let tools = all_tool_definitions();
        assert_eq!(tools.len(), 2, "should have 2 tool definitions");

        let expected_names = ["execute_jq_query", "calculate_distance_between_locations"];
        let expected_required: [&[&str]; 2] =
            [&["persons", "jq_filter"], &["lat1", "lon1", "lat2", "lon2"]];

        for (i, tool) in tools.iter().enumerate() {
            assert_eq!(tool["name"].as_str(), Some(expected_names[i]));
            assert!(tool["description"].as_str().is_some(), "tool {} missing description", i);

            let params = &tool["parameters"];
            assert_eq!(params["type"], "object");
            let required: Vec<&str> = params["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            assert_eq!(required, expected_required[i]);
        }
    }

    #[test]
    fn tool_names_round_trip_through_from_str() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn unknown_tool_is_unsupported() {
        let err = ToolCall::parse(&request("delete_everything", json!({}))).unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedTool(ref name) if name == "delete_everything"));
        assert_eq!(err.to_string(), "unsupported tool: delete_everything");
    }

    #[test]
    fn combine_results_defaults_to_true() {
        let call = ToolCall::parse(&request(
            "execute_jq_query",
            json!({"persons": "person1", "jq_filter": "."}),
        ))
        .unwrap();
        match call {
            ToolCall::ExecuteJqQuery(args) => assert!(args.combine_results),
            other => panic!("expected ExecuteJqQuery, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_argument_is_invalid() {
        let err = ToolCall::parse(&request(
            "calculate_distance_between_locations",
            json!({"lat1": 32.0, "lon1": 34.7, "lat2": 32.1}),
        ))
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: ToolName::CalculateDistance, .. }));
        assert!(err.to_string().contains("lon2"));
    }

    #[tokio::test]
    async fn dispatch_distance_returns_report() {
        let dir = TempDir::new().unwrap();
        let registry = registry_with(&dir, &[], CannedEngine::empty());

        let output = registry
            .dispatch(&request(
                "calculate_distance_between_locations",
                json!({"lat1": 32.0, "lon1": 34.7, "lat2": 32.0, "lon2": 34.7}),
            ))
            .await
            .unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["distance_meters"], 0.0);
        assert_eq!(json["coordinates"]["point1"]["lat"], 32.0);
    }

    #[tokio::test]
    async fn dispatch_jq_query_runs_executor() {
        let dir = TempDir::new().unwrap();
        let engine = CannedEngine::records(vec![json!({
            "timestamp": "2025-07-29T15:00:00Z",
            "latitude": 32.08,
            "longitude": 34.78
        })]);
        let registry = registry_with(&dir, &["person1"], engine);

        let output = registry
            .dispatch(&request(
                "execute_jq_query",
                json!({"persons": "person1", "jq_filter": "map(select(.timestamp | startswith(\"2025-07-29T15\")))"}),
            ))
            .await
            .unwrap();

        match output {
            ToolOutput::Query(outcome) => {
                assert_eq!(outcome.count(), 1);
                assert_eq!(outcome.values()[0]["person"], "person1");
            }
            other => panic!("expected Query output, got {:?}", other),
        }
    }
}
