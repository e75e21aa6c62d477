// ABOUTME: Test doubles for trailquery: a scripted language model, canned filter engines, and connectors.
// ABOUTME: Used in tests to drive the orchestration loop without real API calls or a jq binary.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use trailquery_core::engine::parse_engine_output;
use trailquery_core::{EngineError, FilterEngine};

use crate::providers::ModelConnector;
use crate::runtime::{LanguageModel, ModelError, ModelRequest, ModelResponse};

/// A language model that replays pre-configured responses in order and
/// records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    /// Create a model that answers with `responses`, one per call.
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a model whose first call fails with a provider error.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(message.to_string())])),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .script
            .lock()
            .map_err(|_| ModelError::ProviderError("script lock poisoned".to_string()))?
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ModelError::ProviderError(message)),
            None => Err(ModelError::InvalidResponse(
                "scripted model has no more responses".to_string(),
            )),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Values(Vec<Value>),
    Garbage,
    ExitFailure,
}

/// A filter engine that ignores the expression and answers every file with
/// the same canned result. Records each (expression, file) it is run with.
#[derive(Debug)]
pub struct CannedEngine {
    canned: Canned,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl CannedEngine {
    fn with(canned: Canned) -> Self {
        Self {
            canned,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every query yields no results.
    pub fn empty() -> Self {
        Self::with(Canned::Values(Vec::new()))
    }

    /// Every query yields `values`.
    pub fn records(values: Vec<Value>) -> Self {
        Self::with(Canned::Values(values))
    }

    /// Every query prints non-JSON output.
    pub fn garbage() -> Self {
        Self::with(Canned::Garbage)
    }

    /// Every query exits unsuccessfully.
    pub fn failing() -> Self {
        Self::with(Canned::ExitFailure)
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FilterEngine for CannedEngine {
    async fn run(&self, expression: &str, source: &Path) -> Result<Vec<Value>, EngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((expression.to_string(), source.to_path_buf()));
        }

        match &self.canned {
            Canned::Values(values) => Ok(values.clone()),
            Canned::Garbage => parse_engine_output("jq: this is definitely not json"),
            Canned::ExitFailure => Err(EngineError::Exit {
                status: "exit status: 3".to_string(),
                stderr: "jq: error: syntax error".to_string(),
            }),
        }
    }
}

/// Connector that always hands out the same model.
pub struct StaticConnector(pub Arc<dyn LanguageModel>);

impl ModelConnector for StaticConnector {
    fn connect(&self) -> Result<Arc<dyn LanguageModel>, ModelError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Connector that behaves as if no API key is configured.
pub struct UnavailableConnector;

impl ModelConnector for UnavailableConnector {
    fn connect(&self) -> Result<Arc<dyn LanguageModel>, ModelError> {
        Err(ModelError::MissingCredential(
            "GOOGLE_API_KEY or GEMINI_API_KEY environment variable not set".to_string(),
        ))
    }
}
