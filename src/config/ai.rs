// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_endpoint() -> String {
    DEFAULT_CHAT_ENDPOINT.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_timeout_secs() -> u64 {
    30
}

/// Chat-completion service settings, loaded from `config/ai.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fallback key when the settings file has none. "ENV" means: read OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            api_key: String::new(),
        }
    }
}

impl OracleConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: OracleConfig = serde_json::from_str(&data)?;

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        if cfg.model.trim().is_empty() {
            cfg.model = default_model();
        }
        if cfg.endpoint.trim().is_empty() {
            cfg.endpoint = default_endpoint();
        }
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }
        if cfg.connect_timeout_secs == 0 {
            cfg.connect_timeout_secs = default_connect_timeout_secs();
        }

        Ok(cfg)
    }

    /// Like [`OracleConfig::load_from_file`], but a missing or broken file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!(error = ?e, path = %path.display(), "using default oracle config");
                Self::default()
            }
        }
    }
}
