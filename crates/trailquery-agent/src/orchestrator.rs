// ABOUTME: Orchestration loop answering one natural-language query with tool calls and narration.
// ABOUTME: Runs a tool-calling model call, then a fallback narration call when the model said too little.

use std::sync::Arc;

use crate::answer::{FinalAnswer, QueryOutcome, assemble};
use crate::digest::build_digest;
use crate::policy::NarrativePolicy;
use crate::prompt::{compose_query_prompt, fallback_prompt, system_prompt};
use crate::runtime::{LanguageModel, ModelError, ModelRequest, ResponsePart, ToolMode};
use crate::tools::ToolRegistry;

/// Where a query is in its two-call protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First call: the model must request tools and should narrate the result.
    AwaitingToolNarrative,
    /// Second call: the model narrates a digest of the collected records.
    AwaitingFallbackNarrative,
    Done,
}

impl Phase {
    /// Phase following the tool call, given the fragments collected so far.
    pub fn after_tool_call(policy: &NarrativePolicy, fragments: &[String]) -> Phase {
        if policy.has_real_narrative(fragments) {
            Phase::Done
        } else {
            Phase::AwaitingFallbackNarrative
        }
    }
}

/// Errors that fail a whole query. Tool failures are not among them: those
/// become narrative fragments.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),
}

/// Answers queries by letting a language model drive the tool registry.
/// Each call to [`QueryOrchestrator::answer`] is independent and strictly sequential.
pub struct QueryOrchestrator {
    model: Arc<dyn LanguageModel>,
    tools: ToolRegistry,
    policy: NarrativePolicy,
}

impl QueryOrchestrator {
    pub fn new(model: Arc<dyn LanguageModel>, tools: ToolRegistry, policy: NarrativePolicy) -> Self {
        Self {
            model,
            tools,
            policy,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<FinalAnswer, OrchestratorError> {
        let mut outcome = QueryOutcome::default();
        let mut phase = Phase::AwaitingToolNarrative;

        tracing::info!(
            provider = self.model.provider_name(),
            model = self.model.model_name(),
            "answering query"
        );

        loop {
            phase = match phase {
                Phase::AwaitingToolNarrative => {
                    self.run_tool_call(query, &mut outcome).await?;
                    Phase::after_tool_call(&self.policy, &outcome.fragments)
                }
                Phase::AwaitingFallbackNarrative => {
                    self.run_fallback_call(query, &mut outcome).await?;
                    Phase::Done
                }
                Phase::Done => break,
            };
        }

        tracing::info!(
            records = outcome.records.len(),
            persons = outcome.persons.len(),
            fragments = outcome.fragments.len(),
            "query answered"
        );

        Ok(assemble(outcome))
    }

    async fn run_tool_call(&self, query: &str, outcome: &mut QueryOutcome) -> Result<(), ModelError> {
        let persons = self.tools.executor().store().list_persons();
        let system = system_prompt(&persons, &self.policy);
        let request = ModelRequest::with_tools(
            compose_query_prompt(&system, query),
            self.policy.primary_temperature,
            self.tools.definitions(),
            ToolMode::Required,
        );

        let response = self.model.generate(&request).await?;

        for part in response.parts {
            match part {
                ResponsePart::ToolCall(call) => match self.tools.dispatch(&call).await {
                    Ok(output) => outcome.absorb(&output),
                    Err(e) => {
                        tracing::warn!(tool = %call.name, "tool call failed: {}", e);
                        outcome.push_fragment(format!("Error executing {}: {}", call.name, e));
                    }
                },
                ResponsePart::Text(text) => outcome.push_fragment(text),
            }
        }

        Ok(())
    }

    async fn run_fallback_call(
        &self,
        query: &str,
        outcome: &mut QueryOutcome,
    ) -> Result<(), ModelError> {
        tracing::info!(
            records = outcome.records.len(),
            "model narration insufficient, requesting summary of collected data"
        );

        let digest = build_digest(&outcome.records, &self.policy);
        let request = ModelRequest::text(
            fallback_prompt(query, &digest),
            self.policy.fallback_temperature,
        );

        let response = self.model.generate(&request).await?;
        for text in response.texts() {
            outcome.push_fragment(text);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ModelResponse, ToolCallRequest};
    use crate::testing::{CannedEngine, ScriptedModel};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use trailquery_core::{PersonId, QueryExecutor, RecordStore};

    fn tools_for(dir: &TempDir, persons: &[&str], engine: CannedEngine) -> ToolRegistry {
        for p in persons {
            std::fs::write(dir.path().join(format!("tlv_day_locations_{}.json", p)), "[]").unwrap();
        }
        ToolRegistry::new(QueryExecutor::new(
            RecordStore::new(dir.path()),
            Arc::new(engine),
        ))
    }

    fn records(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "timestamp": format!("2025-07-29T15:{:02}:00Z", i),
                    "latitude": 32.08,
                    "longitude": 34.78
                })
            })
            .collect()
    }

    fn jq_call(persons: &str, filter: &str) -> ResponsePart {
        ResponsePart::ToolCall(ToolCallRequest {
            name: "execute_jq_query".to_string(),
            args: json!({"persons": persons, "jq_filter": filter}),
        })
    }

    fn text(t: &str) -> ResponsePart {
        ResponsePart::Text(t.to_string())
    }

    #[test]
    fn phase_follows_narrative_check() {
        let policy = NarrativePolicy::default();
        assert_eq!(
            Phase::after_tool_call(&policy, &["Short".to_string()]),
            Phase::AwaitingFallbackNarrative
        );
        assert_eq!(
            Phase::after_tool_call(&policy, &["person1 was at the beach at 3pm.".to_string()]),
            Phase::Done
        );
    }

    #[tokio::test]
    async fn narrated_tool_call_needs_one_model_call() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1", "person2"], CannedEngine::records(records(2)));
        let model = Arc::new(ScriptedModel::new(vec![ModelResponse::new(vec![
            jq_call("person1", "map(select(.timestamp | startswith(\"2025-07-29T15\")))"),
            text("At 3pm person1 was near Rothschild Boulevard (32.08, 34.78)."),
        ])]));

        let orchestrator = QueryOrchestrator::new(model.clone(), tools, NarrativePolicy::default());
        let answer = orchestrator.answer("Where was person1 at 3pm?").await.unwrap();

        assert_eq!(model.call_count(), 1);
        let request = &model.requests()[0];
        assert_eq!(request.tool_mode, ToolMode::Required);
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.tools.len(), 2);
        assert!(request.prompt.contains("Available people: person1, person2"));
        assert!(request.prompt.ends_with("User query: Where was person1 at 3pm?"));

        assert_eq!(answer.person, Some(PersonId::from("person1")));
        assert!(answer.persons.is_none());
        assert!(answer.person_colors.is_none());
        assert_eq!(answer.locations.len(), 2);
        assert_eq!(
            answer.summary,
            "At 3pm person1 was near Rothschild Boulevard (32.08, 34.78)."
        );
    }

    #[tokio::test]
    async fn silent_tool_call_triggers_fallback_narration() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1"], CannedEngine::records(records(12)));
        let model = Arc::new(ScriptedModel::new(vec![
            ModelResponse::new(vec![jq_call("person1", "."), text("ok")]),
            ModelResponse::new(vec![text("person1 spent the afternoon near Dizengoff Center.")]),
        ]));

        let orchestrator = QueryOrchestrator::new(model.clone(), tools, NarrativePolicy::default());
        let answer = orchestrator.answer("What did person1 do?").await.unwrap();

        assert_eq!(model.call_count(), 2);
        let fallback = &model.requests()[1];
        assert_eq!(fallback.tool_mode, ToolMode::Disabled);
        assert!(fallback.tools.is_empty());
        assert_eq!(fallback.temperature, 0.2);
        assert!(fallback.prompt.starts_with("User asked: 'What did person1 do?'"));
        assert!(fallback.prompt.contains("person1 (12 locations):"));

        // "ok" survives filtering and comes first, in emission order.
        assert_eq!(
            answer.summary,
            "ok person1 spent the afternoon near Dizengoff Center."
        );
    }

    #[tokio::test]
    async fn silent_fallback_uses_templated_summary() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1"], CannedEngine::records(records(4)));
        let model = Arc::new(ScriptedModel::new(vec![
            ModelResponse::new(vec![jq_call("person1", ".")]),
            ModelResponse::default(),
        ]));

        let orchestrator = QueryOrchestrator::new(model, tools, NarrativePolicy::default());
        let answer = orchestrator.answer("Where was person1?").await.unwrap();

        assert_eq!(
            answer.summary,
            "person1 was tracked at 4 locations during the requested time period."
        );
    }

    #[tokio::test]
    async fn unsupported_tool_becomes_error_fragment() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1"], CannedEngine::empty());
        let model = Arc::new(ScriptedModel::new(vec![ModelResponse::new(vec![
            ResponsePart::ToolCall(ToolCallRequest {
                name: "drop_tables".to_string(),
                args: json!({}),
            }),
        ])]));

        let orchestrator = QueryOrchestrator::new(model.clone(), tools, NarrativePolicy::default());
        let answer = orchestrator.answer("Where was person1?").await.unwrap();

        // The error fragment counts as narrative, so no fallback call is made,
        // but it is filtered from the summary.
        assert_eq!(model.call_count(), 1);
        assert_eq!(answer.summary, crate::answer::NO_DATA_SUMMARY);
    }

    #[tokio::test]
    async fn garbage_engine_output_still_answers() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1"], CannedEngine::garbage());
        let model = Arc::new(ScriptedModel::new(vec![
            ModelResponse::new(vec![jq_call("person1", ".")]),
            ModelResponse::default(),
        ]));

        let orchestrator = QueryOrchestrator::new(model, tools, NarrativePolicy::default());
        let answer = orchestrator.answer("Where was person1?").await.unwrap();

        assert!(answer.locations.is_empty());
        assert_eq!(answer.summary, crate::answer::NO_DATA_SUMMARY);
        assert_eq!(answer.person, Some(PersonId::from("person1")));
    }

    #[tokio::test]
    async fn two_persons_get_colors() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1", "person2"], CannedEngine::records(records(1)));
        let model = Arc::new(ScriptedModel::new(vec![ModelResponse::new(vec![
            jq_call("person2,person1", "."),
            ResponsePart::ToolCall(ToolCallRequest {
                name: "calculate_distance_between_locations".to_string(),
                args: json!({"lat1": 32.08, "lon1": 34.78, "lat2": 32.08, "lon2": 34.78}),
            }),
            text("person1 and person2 were together at 15:00."),
        ])]));

        let orchestrator = QueryOrchestrator::new(model, tools, NarrativePolicy::default());
        let answer = orchestrator.answer("Were they together?").await.unwrap();

        assert!(answer.person.is_none());
        assert_eq!(
            answer.persons,
            Some(vec![PersonId::from("person1"), PersonId::from("person2")])
        );
        assert_eq!(answer.person_colors.unwrap().len(), 2);
        assert_eq!(answer.coordinates.len(), 2);
    }

    #[tokio::test]
    async fn model_failure_fails_the_query() {
        let dir = TempDir::new().unwrap();
        let tools = tools_for(&dir, &["person1"], CannedEngine::empty());
        let model = Arc::new(ScriptedModel::failing("upstream unavailable"));

        let orchestrator = QueryOrchestrator::new(model, tools, NarrativePolicy::default());
        let err = orchestrator.answer("Where was person1?").await.unwrap_err();
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
