// ABOUTME: Filter engine capability for running declarative queries over a JSON record file.
// ABOUTME: JqEngine runs the external `jq` program as a subprocess and parses its JSON output.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while running a filter expression against a record file.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch query engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("query engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("query engine produced malformed output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

/// Runs a filter expression against a JSON source file and returns the
/// resulting values. Expressions are passed through verbatim: whatever the
/// engine accepts is executed.
#[async_trait]
pub trait FilterEngine: Send + Sync {
    async fn run(&self, expression: &str, source: &Path) -> Result<Vec<Value>, EngineError>;
}

/// Filter engine backed by the `jq` command-line program.
#[derive(Debug, Clone)]
pub struct JqEngine {
    program: PathBuf,
}

impl JqEngine {
    /// Use the given jq executable (a bare name is looked up on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for JqEngine {
    fn default() -> Self {
        Self::new("jq")
    }
}

#[async_trait]
impl FilterEngine for JqEngine {
    async fn run(&self, expression: &str, source: &Path) -> Result<Vec<Value>, EngineError> {
        let output = tokio::process::Command::new(&self.program)
            .arg(expression)
            .arg(source)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_engine_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Interpret engine stdout. Blank output means no results. A single array
/// result is flattened into its elements; any other output (a scalar, an
/// object, or a stream of several values) is returned value by value.
pub fn parse_engine_output(stdout: &str) -> Result<Vec<Value>, EngineError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut values = serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<Vec<Value>, _>>()?;

    if let [Value::Array(items)] = values.as_mut_slice() {
        return Ok(std::mem::take(items));
    }

    Ok(values)
}
