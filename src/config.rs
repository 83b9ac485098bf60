//! Configuration loading for the promptc CLI.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `./promptc.toml` (project)
//! 3. `~/.promptc/config.toml` (user)
//!
//! When no file is found the built-in defaults apply. API keys fall back to
//! `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` when not configured.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::compiler::{CompilerBuilder, DEFAULT_CACHE_DIR};
use crate::providers::{Backend, RateLimitConfig};
use crate::types::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerateOptions};
use crate::{Compiler, PromptcError, Result};

/// File name looked up in the working directory.
const PROJECT_CONFIG: &str = "promptc.toml";

/// CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Model backend (default: openai).
    #[serde(default)]
    pub backend: Backend,
    /// Model name (default: the backend's default model).
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Cache directory (default: `.cache`).
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub cache: CacheSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: None,
            api_key: None,
            cache_dir: default_cache_dir(),
            generation: GenerationConfig::default(),
            rate_limit: RateLimitSection::default(),
            cache: CacheSection::default(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

/// Sampling parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature (default: 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token cap (default: 2000).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Backend call quota.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    /// Calls allowed per period (default: 50).
    #[serde(default = "default_calls")]
    pub calls: usize,
    /// Period length in seconds (default: 60).
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            calls: default_calls(),
            period_secs: default_period_secs(),
        }
    }
}

fn default_calls() -> usize {
    50
}

fn default_period_secs() -> u64 {
    60
}

/// Cache behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in hours (default: 24).
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
        }
    }
}

fn default_retention_hours() -> u64 {
    24
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing file
    /// among `./promptc.toml` and `~/.promptc/config.toml` is used, and
    /// defaults apply when neither exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and parse one configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PromptcError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PromptcError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(PromptcError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        let project = PathBuf::from(PROJECT_CONFIG);
        if project.exists() {
            return Ok(Some(project));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".promptc").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }

    /// Resolve the API key: explicit flag, then config file, then the
    /// backend's environment variable.
    pub fn api_key(&self, flag: Option<&str>) -> Result<String> {
        self.api_key_with(flag, |var| std::env::var(var).ok())
    }

    /// [`api_key`](Self::api_key) with a custom environment lookup.
    pub fn api_key_with(
        &self,
        flag: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let env_var = self.backend.api_key_env();
        flag.map(str::to_string)
            .or_else(|| self.api_key.clone())
            .or_else(|| env(env_var))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PromptcError::Configuration(format!(
                    "no API key for {}: pass --api-key, set api_key in the config file, or export {env_var}",
                    self.backend
                ))
            })
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::default()
            .calls(self.rate_limit.calls)
            .period(Duration::from_secs(self.rate_limit.period_secs))
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions::default()
            .temperature(self.generation.temperature)
            .max_tokens(self.generation.max_tokens)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.cache.retention_hours.saturating_mul(60 * 60))
    }

    /// Compiler builder preloaded with this configuration.
    pub fn compiler_builder(&self, api_key: impl Into<String>) -> CompilerBuilder {
        let mut builder = Compiler::builder()
            .backend(self.backend, api_key)
            .cache_dir(&self.cache_dir)
            .retention(self.retention())
            .rate_limit(self.rate_limit_config())
            .options(self.generate_options());
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        builder
    }
}
