// ABOUTME: Provider module for LLM runtime adapters and request-time credential resolution.
// ABOUTME: A ModelConnector hands out a ready LanguageModel, or fails when no API key is configured.

pub mod gemini;

use std::env;
use std::sync::Arc;

use crate::runtime::{LanguageModel, ModelError};

pub use gemini::GeminiModel;

/// Accepted credential variables, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Read the Gemini credential from whichever accepted variable is set.
/// Empty or whitespace-only values count as unset.
pub fn resolve_api_key() -> Option<String> {
    API_KEY_VARS.iter().find_map(|key| {
        env::var(key).ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            if trimmed.is_empty() { None } else { Some(trimmed) }
        })
    })
}

/// Produces a language model for a single request. Credentials are checked
/// at connect time, so a missing key fails the request, not startup.
pub trait ModelConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn LanguageModel>, ModelError>;
}

/// Connects to Gemini using the credential found in the environment.
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    pub base_url: String,
    pub model: String,
}

impl GeminiConnector {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

impl Default for GeminiConnector {
    fn default() -> Self {
        Self::new(gemini::DEFAULT_BASE_URL, gemini::DEFAULT_MODEL)
    }
}

impl ModelConnector for GeminiConnector {
    fn connect(&self) -> Result<Arc<dyn LanguageModel>, ModelError> {
        let api_key = resolve_api_key().ok_or_else(|| {
            ModelError::MissingCredential(
                "GOOGLE_API_KEY or GEMINI_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Arc::new(GeminiModel::new(
            api_key,
            self.base_url.clone(),
            self.model.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn save_env() -> Vec<(&'static str, Option<String>)> {
        API_KEY_VARS.iter().map(|&k| (k, env::var(k).ok())).collect()
    }

    fn restore_env(snapshot: &[(&str, Option<String>)]) {
        for &(key, ref val) in snapshot {
            match val {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }

    fn clear_keys() {
        for key in API_KEY_VARS {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn missing_credential_fails_connect() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        clear_keys();

        let result = GeminiConnector::default().connect();
        restore_env(&saved);

        match result {
            Err(ModelError::MissingCredential(msg)) => {
                assert!(msg.contains("GOOGLE_API_KEY"));
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            Err(other) => panic!("expected MissingCredential, got {}", other),
            Ok(_) => panic!("expected error without credentials"),
        }
    }

    #[test]
    fn google_key_alone_is_accepted() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        clear_keys();
        unsafe { env::set_var("GOOGLE_API_KEY", "google-key") };

        let key = resolve_api_key();
        let connected = GeminiConnector::default().connect();
        restore_env(&saved);

        assert_eq!(key.as_deref(), Some("google-key"));
        match connected {
            Ok(model) => {
                assert_eq!(model.provider_name(), "gemini");
                assert_eq!(model.model_name(), gemini::DEFAULT_MODEL);
            }
            Err(e) => panic!("expected Ok, got Err: {}", e),
        }
    }

    #[test]
    fn gemini_key_wins_over_google_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        unsafe {
            env::set_var("GEMINI_API_KEY", "gemini-key");
            env::set_var("GOOGLE_API_KEY", "google-key");
        }

        let key = resolve_api_key();
        restore_env(&saved);

        assert_eq!(key.as_deref(), Some("gemini-key"));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        clear_keys();
        unsafe { env::set_var("GEMINI_API_KEY", "   ") };

        let key = resolve_api_key();
        restore_env(&saved);

        assert!(key.is_none());
    }
}
