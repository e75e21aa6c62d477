// ABOUTME: Agent layer for trailquery, letting a language model answer location questions through tools.
// ABOUTME: Defines the model runtime trait, the tool registry, and the two-phase orchestration loop.

pub mod answer;
pub mod digest;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod providers;
pub mod runtime;
pub mod testing;
pub mod tools;

pub use answer::{FinalAnswer, QueryOutcome, assemble};
pub use orchestrator::{OrchestratorError, Phase, QueryOrchestrator};
pub use policy::{NarrativePolicy, PERSON_COLORS};
pub use providers::{GeminiConnector, GeminiModel, ModelConnector};
pub use runtime::{LanguageModel, ModelError, ModelRequest, ModelResponse, ResponsePart, ToolCallRequest, ToolMode};
pub use tools::{ToolError, ToolName, ToolRegistry, all_tool_definitions};
