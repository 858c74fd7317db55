//! Configuration: TOML file + environment overrides.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration that runs fully offline with the template narrator.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;
use crate::domain::perception::Vocabulary;

/// Environment keys that override file values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEnv {
    NarratorUrl,
    NarratorMode,
    NarratorTimeoutMs,
}

impl ConfigEnv {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigEnv::NarratorUrl => "ETHICALDRIVE_NARRATOR_URL",
            ConfigEnv::NarratorMode => "ETHICALDRIVE_NARRATOR_MODE",
            ConfigEnv::NarratorTimeoutMs => "ETHICALDRIVE_NARRATOR_TIMEOUT_MS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorMode {
    /// Remote generative text endpoint.
    Http,
    /// Local, deterministic templates.
    #[default]
    Template,
}

impl std::str::FromStr for NarratorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(NarratorMode::Http),
            "template" => Ok(NarratorMode::Template),
            other => Err(format!("expected 'http' or 'template', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarratorConfig {
    pub mode: NarratorMode,
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    /// Name of the environment variable holding the bearer token, if any.
    pub api_key_env: Option<String>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            mode: NarratorMode::Template,
            endpoint: "http://localhost:3400".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_ms: 15_000,
            api_key_env: Some("ETHICALDRIVE_API_KEY".to_string()),
        }
    }
}

impl NarratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Text shown when a narrative call fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub summary: String,
    pub explanation: String,
    pub video: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            summary: "Could not generate AI summary.".to_string(),
            explanation: "Could not generate AI explanation.".to_string(),
            video: "Could not analyze video.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub vocabulary: Vocabulary,
    pub narrator: NarratorConfig,
    pub placeholders: PlaceholderConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (tests pass a map).
    pub fn apply_env_with(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let read = |key: ConfigEnv| {
            lookup(key.as_str())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = read(ConfigEnv::NarratorUrl) {
            self.narrator.endpoint = url;
        }
        if let Some(mode) = read(ConfigEnv::NarratorMode) {
            self.narrator.mode = mode.parse().map_err(|message| ConfigError::Invalid {
                key: ConfigEnv::NarratorMode.as_str().to_string(),
                message,
            })?;
        }
        if let Some(timeout) = read(ConfigEnv::NarratorTimeoutMs) {
            self.narrator.timeout_ms =
                timeout.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                    key: ConfigEnv::NarratorTimeoutMs.as_str().to_string(),
                    message: e.to_string(),
                })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.narrator.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "narrator.timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let endpoint = self.narrator.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "narrator.endpoint".to_string(),
                message: format!("'{endpoint}' is not an http(s) url"),
            });
        }
        Ok(())
    }
}
