//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! YAML file, then environment variables. Keys are the lower-cased
//! environment variable names (`USE_DUMMY_AI` -> `use_dummy_ai`).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use supportdesk_core::{Error, Result};

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Heuristic triage and template replies instead of the model
    #[serde(default)]
    pub use_dummy_ai: bool,

    /// Model name sent with every chat-completion request
    #[serde(default = "default_model")]
    pub openai_model: String,

    /// Bearer credential; absent means delegated calls fail fast
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Base URL of the chat-completion API
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,

    /// Delay between streamed template words
    #[serde(default = "default_stream_pacing_ms")]
    pub stream_pacing_ms: u64,

    /// Simulated latency of the mock fulfillment lookup
    #[serde(default = "default_fulfillment_latency_ms")]
    pub fulfillment_latency_ms: u64,

    /// Timeout for upstream HTTP requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Load from an optional file plus the process environment
    pub fn load(config_path: &str) -> Result<Self> {
        Self::load_from(Some(Path::new(config_path)), None)
    }

    /// Load from an optional file plus an explicit environment map.
    ///
    /// `env = None` reads the process environment. A missing file is not an
    /// error.
    pub fn load_from(
        config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(Environment::default().try_parsing(true).source(env));

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::config(format!("Failed to load settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.openai_model.trim().is_empty() {
            return Err(Error::config("openai_model must not be empty"));
        }
        if !self.openai_base_url.starts_with("http://")
            && !self.openai_base_url.starts_with("https://")
        {
            return Err(Error::config(format!(
                "openai_base_url must be an http(s) URL, got '{}'",
                self.openai_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Whether a non-blank credential is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// First seven characters of the credential, for diagnostics
    pub fn api_key_prefix(&self) -> Option<String> {
        self.openai_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| k.chars().take(7).collect())
    }

    pub fn stream_pacing(&self) -> Duration {
        Duration::from_millis(self.stream_pacing_ms)
    }

    pub fn fulfillment_latency(&self) -> Duration {
        Duration::from_millis(self.fulfillment_latency_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Human readable mode name
    pub fn mode(&self) -> &'static str {
        if self.use_dummy_ai {
            "dummy"
        } else {
            "llm"
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            use_dummy_ai: false,
            openai_model: default_model(),
            openai_api_key: None,
            openai_base_url: default_base_url(),
            stream_pacing_ms: default_stream_pacing_ms(),
            fulfillment_latency_ms: default_fulfillment_latency_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_stream_pacing_ms() -> u64 {
    40
}

fn default_fulfillment_latency_ms() -> u64 {
    150
}

fn default_request_timeout_secs() -> u64 {
    60
}
