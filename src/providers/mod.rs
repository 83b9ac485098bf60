//! Model adapters for remote text-generation backends.
//!
//! Each backend gets one [`ModelAdapter`] implementation that owns its
//! [`RateWindow`]. Which adapter to use is decided once, by configuration
//! (see [`Backend`] and [`CompilerBuilder`](crate::CompilerBuilder)).

mod http;

pub mod anthropic;
pub mod openai;
pub mod rate_window;
pub mod traits;

pub use anthropic::{AnthropicAdapter, DEFAULT_ANTHROPIC_MODEL};
pub use openai::{DEFAULT_OPENAI_MODEL, OpenAiAdapter};
pub use rate_window::{RateLimitConfig, RateWindow};
pub use traits::ModelAdapter;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PromptcError;

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI chat completions (GPT models).
    #[default]
    #[serde(alias = "gpt")]
    #[cfg_attr(feature = "cli", value(name = "openai", alias = "gpt"))]
    OpenAi,
    /// Anthropic messages (Claude models).
    #[serde(alias = "claude")]
    #[cfg_attr(feature = "cli", value(alias = "claude"))]
    Anthropic,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Anthropic => "anthropic",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenAi => DEFAULT_OPENAI_MODEL,
            Backend::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }

    /// Environment variable consulted for the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Backend::OpenAi => "OPENAI_API_KEY",
            Backend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = PromptcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(Backend::OpenAi),
            "anthropic" | "claude" => Ok(Backend::Anthropic),
            other => Err(PromptcError::Configuration(format!(
                "unknown backend '{other}' (expected openai or anthropic)"
            ))),
        }
    }
}
