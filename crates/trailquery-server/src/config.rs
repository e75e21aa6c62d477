// ABOUTME: Configuration loading for the trailquery server.
// ABOUTME: Reads environment variables with defaults and resolves the bind address and port.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use trailquery_agent::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 8000;
pub const ALTERNATE_PORT: u16 = 8001;

/// Front-end origins allowed by default.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:3001",
];

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TRAILQUERY_HOST is not a valid IP address: {0}")]
    InvalidHost(String),

    #[error("TRAILQUERY_PORT is not a valid port number: {0}")]
    InvalidPort(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub jq_bin: PathBuf,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - TRAILQUERY_DATA_DIR: directory with person record files (default: .)
    /// - TRAILQUERY_HOST: address to bind (default: 0.0.0.0)
    /// - TRAILQUERY_PORT: default port (default: 8000)
    /// - TRAILQUERY_JQ_BIN: jq executable (default: jq)
    /// - TRAILQUERY_ALLOWED_ORIGINS: comma-separated CORS origins
    /// - GEMINI_MODEL / GEMINI_BASE_URL: language model selection
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = non_empty_env("TRAILQUERY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let host_str = non_empty_env("TRAILQUERY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host: IpAddr = host_str
            .parse()
            .map_err(|_| ConfigError::InvalidHost(host_str))?;

        let port = match non_empty_env("TRAILQUERY_PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => DEFAULT_PORT,
        };

        let jq_bin = non_empty_env("TRAILQUERY_JQ_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("jq"));

        let gemini_model =
            non_empty_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let gemini_base_url =
            non_empty_env("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let allowed_origins = match non_empty_env("TRAILQUERY_ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            data_dir,
            host,
            port,
            jq_bin,
            gemini_model,
            gemini_base_url,
            allowed_origins,
        })
    }

    /// Address to listen on. The alternate port replaces the configured one
    /// when requested on the command line.
    pub fn bind_addr(&self, use_alternate_port: bool) -> SocketAddr {
        let port = if use_alternate_port {
            ALTERNATE_PORT
        } else {
            self.port
        };
        SocketAddr::new(self.host, port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate process-wide env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "TRAILQUERY_DATA_DIR",
        "TRAILQUERY_HOST",
        "TRAILQUERY_PORT",
        "TRAILQUERY_JQ_BIN",
        "TRAILQUERY_ALLOWED_ORIGINS",
        "GEMINI_MODEL",
        "GEMINI_BASE_URL",
    ];

    /// SAFETY: Only call while holding ENV_MUTEX to prevent concurrent env var access.
    unsafe fn clear_env() {
        for key in ENV_VARS {
            // SAFETY: caller holds ENV_MUTEX
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn config_loads_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe { clear_env() };

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.port, 8000);
        assert_eq!(config.jq_bin, PathBuf::from("jq"));
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.allowed_origins.len(), 4);
        assert_eq!(
            config.bind_addr(false),
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn alternate_port_flag_switches_port() {
        let _lock = ENV_MUTEX.lock().unwrap();
        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe { clear_env() };

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_addr(true).port(), 8001);
    }

    #[test]
    fn env_overrides_are_applied() {
        let _lock = ENV_MUTEX.lock().unwrap();
        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe {
            clear_env();
            std::env::set_var("TRAILQUERY_DATA_DIR", "/srv/tracks");
            std::env::set_var("TRAILQUERY_HOST", "127.0.0.1");
            std::env::set_var("TRAILQUERY_PORT", "9100");
            std::env::set_var("TRAILQUERY_ALLOWED_ORIGINS", "https://maps.example.com, ");
        }

        let config = ServerConfig::from_env().unwrap();

        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe { clear_env() };

        assert_eq!(config.data_dir, PathBuf::from("/srv/tracks"));
        assert_eq!(
            config.bind_addr(false),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.allowed_origins, vec!["https://maps.example.com".to_string()]);
    }

    #[test]
    fn config_rejects_bad_port() {
        let _lock = ENV_MUTEX.lock().unwrap();
        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe {
            clear_env();
            std::env::set_var("TRAILQUERY_PORT", "eighty");
        }

        let result = ServerConfig::from_env();

        // SAFETY: holding ENV_MUTEX, no concurrent env var access
        unsafe { clear_env() };

        let err = result.unwrap_err();
        assert!(err.to_string().contains("TRAILQUERY_PORT"), "unexpected error: {}", err);
    }
}
