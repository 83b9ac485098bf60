//! Cache-addressed code generation.
//!
//! [`CodeGenerator::generate`] runs one request through the pipeline:
//!
//! ```text
//! cache check ─[hit, not forced]──────────────────────────────▶ cached text
//!      └─[miss or forced]─▶ render ─▶ invoke ─▶ process ─▶ validate ─▶ store ─▶ fresh text
//! ```
//!
//! A failure at any step after the cache check is returned as-is and
//! nothing is written to the cache. A forced rebuild skips the hit branch
//! but still stores its result, refreshing the entry.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::processor::ResponseProcessor;
use crate::providers::ModelAdapter;
use crate::telemetry;
use crate::template::{CodeTemplate, PromptTemplate};
use crate::types::{GenerateOptions, RequestDescriptor};
use crate::{PromptcError, Result};

/// Turns request descriptors into processed code, memoized in a cache.
pub struct CodeGenerator {
    adapter: Arc<dyn ModelAdapter>,
    cache: CacheStore,
    template: Arc<dyn PromptTemplate>,
    processor: ResponseProcessor,
    options: GenerateOptions,
}

impl CodeGenerator {
    /// Generator using [`CodeTemplate`], the default processor and default
    /// generation options.
    pub fn new(adapter: Arc<dyn ModelAdapter>, cache: CacheStore) -> Self {
        Self {
            adapter,
            cache,
            template: Arc::new(CodeTemplate),
            processor: ResponseProcessor::new(),
            options: GenerateOptions::default(),
        }
    }

    pub fn with_template(mut self, template: Arc<dyn PromptTemplate>) -> Self {
        self.template = template;
        self
    }

    pub fn with_processor(mut self, processor: ResponseProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Set generation options. An explicit `system_prompt` overrides the
    /// template's.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn adapter(&self) -> &Arc<dyn ModelAdapter> {
        &self.adapter
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Produce processed code for `descriptor`.
    ///
    /// Returns the cached text when a fresh entry exists and
    /// `force_rebuild` is false; otherwise asks the backend and caches the
    /// processed result.
    pub async fn generate(
        &self,
        descriptor: &RequestDescriptor,
        force_rebuild: bool,
    ) -> Result<String> {
        let backend = self.adapter.name();

        if force_rebuild {
            debug!(backend, name = descriptor.name(), "forced rebuild, skipping cache");
        } else if let Some(cached) = self.cache.lookup(descriptor) {
            debug!(backend, name = descriptor.name(), "cache hit");
            return Ok(cached);
        } else {
            debug!(backend, name = descriptor.name(), "cache miss");
        }

        let prompt = self.template.render(descriptor)?;
        let options = self.effective_options();

        let raw = self.adapter.generate(&prompt, &options).await?;
        let code = self.processor.process(&raw, descriptor)?;
        if !self.adapter.validate(&code) {
            return Err(PromptcError::EmptyResponse);
        }

        self.cache.store(descriptor, &code)?;

        metrics::counter!(telemetry::GENERATIONS_TOTAL, "backend" => backend.to_owned())
            .increment(1);
        info!(
            backend,
            name = descriptor.name(),
            code_len = code.len(),
            force_rebuild,
            "generated fresh output"
        );
        Ok(code)
    }

    fn effective_options(&self) -> GenerateOptions {
        let mut options = self.options.clone();
        if options.system_prompt.is_none() {
            options.system_prompt = Some(self.template.system_prompt().to_string());
        }
        options
    }
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("adapter", &self.adapter.name())
            .field("cache", &self.cache)
            .field("processor", &self.processor)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and replies with a fixed text.
    struct Recording {
        reply: String,
        calls: Mutex<Vec<(String, GenerateOptions)>>,
    }

    impl Recording {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelAdapter for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), options.clone()));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn template_system_prompt_is_sent() {
        let adapter = Recording::new("x = 1");
        let generator = CodeGenerator::new(adapter.clone(), CacheStore::in_memory());
        generator
            .generate(&RequestDescriptor::new().with("name", "Thing"), false)
            .await
            .unwrap();

        let calls = adapter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("Name: Thing"));
        assert_eq!(
            calls[0].1.system_prompt.as_deref(),
            Some(CodeTemplate.system_prompt())
        );
    }

    #[tokio::test]
    async fn explicit_system_prompt_wins() {
        let adapter = Recording::new("x = 1");
        let generator = CodeGenerator::new(adapter.clone(), CacheStore::in_memory())
            .with_options(GenerateOptions::default().system_prompt("terse"));
        generator
            .generate(&RequestDescriptor::new(), false)
            .await
            .unwrap();

        let calls = adapter.calls.lock().unwrap();
        assert_eq!(calls[0].1.system_prompt.as_deref(), Some("terse"));
    }

    #[tokio::test]
    async fn blank_output_is_empty_response_and_not_cached() {
        let adapter = Recording::new("```python\n   \n```");
        let cache = CacheStore::in_memory();
        let generator = CodeGenerator::new(adapter, cache.clone());
        let descriptor = RequestDescriptor::new().with("name", "Blank");

        let err = generator.generate(&descriptor, false).await.unwrap_err();
        assert!(matches!(err, PromptcError::EmptyResponse));
        assert_eq!(cache.lookup(&descriptor), None);
    }
}
