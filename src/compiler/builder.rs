//! Builder for configuring compiler instances

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::Compiler;
use crate::cache::{CacheConfig, CacheStore, FileBackend, MemoryBackend};
use crate::generator::CodeGenerator;
use crate::processor::{CodeFormatter, ResponseProcessor};
use crate::providers::{AnthropicAdapter, Backend, ModelAdapter, OpenAiAdapter, RateLimitConfig};
use crate::types::GenerateOptions;
use crate::{PromptcError, Result};

/// Cache directory used when none is configured.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

enum AdapterChoice {
    Remote { backend: Backend, api_key: String },
    Custom(Arc<dyn ModelAdapter>),
}

enum CacheChoice {
    Dir(PathBuf),
    Memory,
}

/// Builder for configuring compiler instances.
///
/// ```rust,no_run
/// # use promptc::{Compiler, RequestDescriptor};
/// # async fn run() -> promptc::Result<()> {
/// let compiler = Compiler::builder()
///     .anthropic("sk-ant-your-key")
///     .cache_dir(".cache")
///     .build()?;
///
/// let descriptor = RequestDescriptor::new()
///     .with("name", "fizzbuzz")
///     .with("description", "Print fizzbuzz up to n");
/// let artifact = compiler.compile(&descriptor, false).await?;
/// println!("{}", artifact.code);
/// # Ok(())
/// # }
/// ```
pub struct CompilerBuilder {
    adapter: Option<AdapterChoice>,
    model: Option<String>,
    base_url: Option<String>,
    rate_limit: RateLimitConfig,
    cache: CacheChoice,
    cache_config: CacheConfig,
    options: GenerateOptions,
    formatter: Option<Arc<dyn CodeFormatter>>,
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            adapter: None,
            model: None,
            base_url: None,
            rate_limit: RateLimitConfig::default(),
            cache: CacheChoice::Dir(PathBuf::from(DEFAULT_CACHE_DIR)),
            cache_config: CacheConfig::default(),
            options: GenerateOptions::default(),
            formatter: None,
        }
    }

    /// Use a remote backend with the given API key.
    pub fn backend(mut self, backend: Backend, api_key: impl Into<String>) -> Self {
        self.adapter = Some(AdapterChoice::Remote {
            backend,
            api_key: api_key.into(),
        });
        self
    }

    /// Use OpenAI (GPT models).
    pub fn openai(self, api_key: impl Into<String>) -> Self {
        self.backend(Backend::OpenAi, api_key)
    }

    /// Use Anthropic (Claude models).
    pub fn anthropic(self, api_key: impl Into<String>) -> Self {
        self.backend(Backend::Anthropic, api_key)
    }

    /// Use a caller-supplied adapter. Model, base URL and rate limit
    /// settings do not apply to it.
    pub fn adapter(mut self, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.adapter = Some(AdapterChoice::Custom(adapter));
        self
    }

    /// Model name (default: the backend's default model).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the backend's base URL (proxies, testing with wiremock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Call quota for the remote backend (default: 50 per minute).
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Persist cache entries under `dir` (default: `.cache`).
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = CacheChoice::Dir(dir.into());
        self
    }

    /// Keep cache entries in memory only.
    pub fn memory_cache(mut self) -> Self {
        self.cache = CacheChoice::Memory;
        self
    }

    /// How long cache entries stay valid (default: 24 hours).
    pub fn retention(mut self, retention: Duration) -> Self {
        self.cache_config = self.cache_config.retention(retention);
        self
    }

    /// Generation options (temperature, token cap, system prompt override).
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default Python formatter.
    pub fn formatter(mut self, formatter: Arc<dyn CodeFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Build the compiler.
    pub fn build(self) -> Result<Compiler> {
        let adapter: Arc<dyn ModelAdapter> = match self.adapter {
            None => {
                return Err(PromptcError::Configuration(
                    "no model backend configured".to_string(),
                ));
            }
            Some(AdapterChoice::Custom(adapter)) => adapter,
            Some(AdapterChoice::Remote { backend, api_key }) => {
                if api_key.trim().is_empty() {
                    return Err(PromptcError::Configuration(format!(
                        "empty API key for {backend}"
                    )));
                }
                let model = self
                    .model
                    .unwrap_or_else(|| backend.default_model().to_string());
                match backend {
                    Backend::OpenAi => {
                        let adapter = match self.base_url {
                            Some(url) => OpenAiAdapter::with_base_url(api_key, model, url),
                            None => OpenAiAdapter::new(api_key, model),
                        };
                        Arc::new(adapter.rate_limit(self.rate_limit))
                    }
                    Backend::Anthropic => {
                        let adapter = match self.base_url {
                            Some(url) => AnthropicAdapter::with_base_url(api_key, model, url),
                            None => AnthropicAdapter::new(api_key, model),
                        };
                        Arc::new(adapter.rate_limit(self.rate_limit))
                    }
                }
            }
        };

        let cache = match self.cache {
            CacheChoice::Dir(dir) => {
                CacheStore::with_config(Arc::new(FileBackend::new(dir)?), self.cache_config)
            }
            CacheChoice::Memory => {
                CacheStore::with_config(Arc::new(MemoryBackend::new()), self.cache_config)
            }
        };

        let processor = match self.formatter {
            Some(formatter) => ResponseProcessor::with_formatter(formatter),
            None => ResponseProcessor::new(),
        };

        debug!(
            backend = adapter.name(),
            cache = ?cache,
            "compiler built"
        );

        let generator = CodeGenerator::new(adapter, cache)
            .with_processor(processor)
            .with_options(self.options);
        Ok(Compiler::new(generator))
    }
}
