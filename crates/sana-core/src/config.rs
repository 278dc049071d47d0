//! Application configuration.
//!
//! Configuration is explicit state injected at startup: the screening
//! config (stage thresholds, model, knowledge paths) comes from an optional
//! `config.toml`, and credentials come from a secret file or the
//! environment. Nothing here is read from ambient globals after startup.

use crate::error::{Result, SanaError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// User-message-count thresholds that drive stage selection.
///
/// The defaults (10 / 15 / 16) are carried over verbatim from the original
/// turn-budget design. They are configuration rather than hard-coded
/// constants because no algorithmic rationale backs the exact values; any
/// `interviewing_max <= follow_up_max <= analyzing_max` assignment keeps
/// the stage sequence monotone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThresholds {
    /// Highest user-message count still in the Interviewing stage.
    pub interviewing_max: usize,
    /// Highest user-message count still in the FollowUp stage.
    pub follow_up_max: usize,
    /// Highest user-message count still in the Analyzing stage.
    pub analyzing_max: usize,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            interviewing_max: 10,
            follow_up_max: 15,
            analyzing_max: 16,
        }
    }
}

impl StageThresholds {
    /// Checks the ordering invariant that keeps stages monotone.
    pub fn validate(&self) -> Result<()> {
        if self.interviewing_max <= self.follow_up_max
            && self.follow_up_max <= self.analyzing_max
        {
            Ok(())
        } else {
            Err(SanaError::config(format!(
                "stage thresholds must be non-decreasing: {} <= {} <= {} does not hold",
                self.interviewing_max, self.follow_up_max, self.analyzing_max
            )))
        }
    }
}

/// Top-level screening configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Stage-selection thresholds.
    #[serde(default)]
    pub stages: StageThresholds,
    /// Gemini model used by all agents.
    #[serde(default = "default_model")]
    pub model: String,
    /// Default knowledge documents looked up on disk at each turn.
    #[serde(default = "default_knowledge")]
    pub default_knowledge: Vec<PathBuf>,
    /// Override for the seeded welcome message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome: Option<String>,
    /// Per-turn timeout applied by the UI collaborator, in seconds.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_knowledge() -> Vec<PathBuf> {
    vec![PathBuf::from("PHQ-9.pdf")]
}

fn default_turn_timeout_secs() -> u64 {
    120
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            stages: StageThresholds::default(),
            model: default_model(),
            default_knowledge: default_knowledge(),
            welcome: None,
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

impl ScreeningConfig {
    /// Loads the config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.stages.validate()?;
        Ok(config)
    }

    /// Loads from the given path, the default location, or falls back to
    /// the built-in defaults when no file exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/sana/config.toml`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sana").join("config.toml"))
    }
}

/// Gemini credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
}

/// Secret configuration (API keys), kept apart from `ScreeningConfig` so
/// the non-sensitive file can be shared freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

impl SecretConfig {
    /// Loads secrets from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Reads credentials from the environment, if set.
    pub fn from_env() -> Self {
        let gemini = std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| GeminiConfig { api_key });
        Self { gemini }
    }

    /// Resolves credentials: the environment wins over the secret file at
    /// the default location (`<config dir>/sana/secret.toml`).
    pub fn resolve() -> Result<Self> {
        let from_env = Self::from_env();
        if from_env.gemini.is_some() {
            return Ok(from_env);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sana").join("secret.toml"))
    }

    /// The Gemini API key, or a config error naming how to provide one.
    pub fn require_gemini_key(&self) -> Result<&str> {
        self.gemini
            .as_ref()
            .map(|g| g.api_key.as_str())
            .ok_or_else(|| {
                SanaError::config(format!(
                    "no Gemini API key: set {GEMINI_API_KEY_ENV} or add [gemini] api_key to secret.toml"
                ))
            })
    }
}
