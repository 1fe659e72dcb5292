//! Runtime configuration
//!
//! Values load from a TOML file (every key optional), may be overridden from
//! the environment, and are validated before use.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TabError};

/// Configuration for the interpreter client, bridge and session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabmateConfig {
    /// Base URL of the natural-language interpreter service
    pub interpreter_url: String,

    /// Upper bound for a single interpreter round trip, in milliseconds
    pub request_timeout_ms: u64,

    /// Number of command records kept in the history ring
    pub history_limit: usize,

    /// Maximum number of smart suggestions derived from the tab set
    pub max_suggestions: usize,

    /// Origin this process presents when talking to the bridge
    pub bridge_origin: String,

    /// Hosts whose origins the bridge accepts requests from
    pub allowed_origin_hosts: Vec<String>,

    /// URLs sent to the categorizer when no bridge is connected
    pub seed_urls: Vec<String>,
}

impl Default for TabmateConfig {
    fn default() -> Self {
        Self {
            interpreter_url: "http://127.0.0.1:5000".into(),
            request_timeout_ms: 30_000,
            history_limit: 10,
            max_suggestions: 4,
            bridge_origin: "http://localhost:3000".into(),
            allowed_origin_hosts: vec!["localhost".into(), "127.0.0.1".into(), "::1".into()],
            seed_urls: Vec::new(),
        }
    }
}

impl TabmateConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TabmateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// Optional: TABMATE_INTERPRETER_URL
    /// Optional: TABMATE_TIMEOUT_MS
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("TABMATE_INTERPRETER_URL") {
            self.interpreter_url = url;
        }
        if let Ok(ms) = std::env::var("TABMATE_TIMEOUT_MS") {
            self.request_timeout_ms = ms
                .parse()
                .map_err(|_| TabError::Config(format!("TABMATE_TIMEOUT_MS is not a number: {}", ms)))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.interpreter_url).map_err(|e| {
            TabError::Config(format!("interpreter_url {:?}: {}", self.interpreter_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TabError::Config(format!(
                "interpreter_url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(TabError::Config("request_timeout_ms must be positive".into()));
        }

        if self.history_limit == 0 {
            return Err(TabError::Config("history_limit must be at least 1".into()));
        }

        if self.allowed_origin_hosts.is_empty() {
            return Err(TabError::Config(
                "allowed_origin_hosts must name at least one host".into(),
            ));
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<TabmateConfig> = OnceLock::new();

/// Get the global config (initializes with defaults if not set)
pub fn config() -> &'static TabmateConfig {
    CONFIG.get_or_init(TabmateConfig::default)
}

/// Set the global config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: TabmateConfig) -> std::result::Result<(), TabmateConfig> {
    CONFIG.set(config)
}
