//! Configuration loading, validation, and management for ScholarLoop.
//!
//! Loads configuration from `~/.scholarloop/config.toml` with environment
//! variable overrides. Validates iteration and result bounds at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inclusive bounds on research iterations per run.
pub const ITERATION_BOUNDS: (u32, u32) = (3, 15);

/// Inclusive bounds on results requested per search.
pub const RESULTS_PER_SEARCH_BOUNDS: (u32, u32) = (3, 10);

/// Models offered by the reference deployment.
pub const KNOWN_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-haiku-20241022",
];

/// The root configuration structure.
///
/// Maps directly to `~/.scholarloop/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model identifier sent to the conversation model
    #[serde(default = "default_model")]
    pub model: String,

    /// Research iterations per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Results requested per search step
    #[serde(default = "default_results_per_search")]
    pub results_per_search: u32,

    /// Output budget for iteration and analysis calls
    #[serde(default = "default_iteration_max_tokens")]
    pub iteration_max_tokens: u32,

    /// Output budget for the final synthesis call
    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,

    /// Where `research` writes report and data exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub anthropic: ProviderConfig,

    #[serde(default)]
    pub exa: ProviderConfig,

    #[serde(default)]
    pub firecrawl: ProviderConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

fn default_model() -> String {
    KNOWN_MODELS[0].into()
}
fn default_max_iterations() -> u32 {
    3
}
fn default_results_per_search() -> u32 {
    5
}
fn default_iteration_max_tokens() -> u32 {
    4000
}
fn default_synthesis_max_tokens() -> u32 {
    8192
}

/// Credentials and endpoint for one external provider.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Paper-search request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_type")]
    pub search_type: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// Characters of article text returned per result
    #[serde(default = "default_max_characters")]
    pub max_characters: u32,
}

fn default_search_type() -> String {
    "keyword".into()
}
fn default_category() -> String {
    "research paper".into()
}
fn default_max_characters() -> u32 {
    5000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_type: default_search_type(),
            category: default_category(),
            max_characters: default_max_characters(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.scholarloop/config.toml).
    ///
    /// Environment variables override the file:
    /// - `ANTHROPIC_API_KEY`, `EXA_API_KEY`, `FIRECRAWL_API_KEY`
    /// - `SCHOLARLOOP_MODEL`, `SCHOLARLOOP_MAX_ITERATIONS`, `SCHOLARLOOP_RESULTS_PER_SEARCH`
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// File plus environment, without bounds checks.
    ///
    /// For callers that apply further overrides; they must call
    /// [`AppConfig::validate`] once those are in place.
    pub fn load_unvalidated() -> Result<Self, ConfigError> {
        let mut config = Self::read_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_from(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(key) = lookup("EXA_API_KEY") {
            self.exa.api_key = Some(key);
        }
        if let Some(key) = lookup("FIRECRAWL_API_KEY") {
            self.firecrawl.api_key = Some(key);
        }
        if let Some(model) = lookup("SCHOLARLOOP_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("SCHOLARLOOP_MAX_ITERATIONS") {
            self.max_iterations = parse_env_u32("SCHOLARLOOP_MAX_ITERATIONS", &raw)?;
        }
        if let Some(raw) = lookup("SCHOLARLOOP_RESULTS_PER_SEARCH") {
            self.results_per_search = parse_env_u32("SCHOLARLOOP_RESULTS_PER_SEARCH", &raw)?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".scholarloop")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_iterations(self.max_iterations)?;
        validate_results_per_search(self.results_per_search)?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.iteration_max_tokens == 0 || self.synthesis_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max token budgets must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Names of the API keys that are not configured.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.anthropic.api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.exa.api_key.is_none() {
            missing.push("EXA_API_KEY");
        }
        if self.firecrawl.api_key.is_none() {
            missing.push("FIRECRAWL_API_KEY");
        }
        missing
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_iterations: default_max_iterations(),
            results_per_search: default_results_per_search(),
            iteration_max_tokens: default_iteration_max_tokens(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
            output_dir: None,
            anthropic: ProviderConfig::default(),
            exa: ProviderConfig::default(),
            firecrawl: ProviderConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Check an iteration count against [`ITERATION_BOUNDS`].
pub fn validate_iterations(n: u32) -> Result<(), ConfigError> {
    let (min, max) = ITERATION_BOUNDS;
    if !(min..=max).contains(&n) {
        return Err(ConfigError::ValidationError(format!(
            "max_iterations must be between {min} and {max}, got {n}"
        )));
    }
    Ok(())
}

/// Check a per-search result count against [`RESULTS_PER_SEARCH_BOUNDS`].
pub fn validate_results_per_search(n: u32) -> Result<(), ConfigError> {
    let (min, max) = RESULTS_PER_SEARCH_BOUNDS;
    if !(min..=max).contains(&n) {
        return Err(ConfigError::ValidationError(format!(
            "results_per_search must be between {min} and {max}, got {n}"
        )));
    }
    Ok(())
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{name} must be an integer, got '{raw}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
