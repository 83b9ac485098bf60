//! The caller-facing compile operation.
//!
//! A [`Compiler`] turns a [`RequestDescriptor`] into a
//! [`GeneratedArtifact`]: code from the [`CodeGenerator`], tests from the
//! [`TestGenerator`]. Test generation is not available yet; its absence
//! shows up as `tests: None` rather than as an error.

pub mod builder;

pub use builder::{CompilerBuilder, DEFAULT_CACHE_DIR};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::generator::CodeGenerator;
use crate::template::{PromptTemplate, TestTemplate};
use crate::types::{GeneratedArtifact, RequestDescriptor};
use crate::{PromptcError, Result};

/// Main entry point: compiles prompt descriptors into code.
pub struct Compiler {
    generator: CodeGenerator,
    tests: TestGenerator,
    tests_unavailable_logged: AtomicBool,
}

impl Compiler {
    /// Create a new builder for configuring the compiler.
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn new(generator: CodeGenerator) -> Self {
        Self {
            generator,
            tests: TestGenerator::new(),
            tests_unavailable_logged: AtomicBool::new(false),
        }
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Generate code (and tests, when available) for `descriptor`.
    ///
    /// With `force_rebuild` the cache is bypassed for the read but still
    /// refreshed with the new output.
    pub async fn compile(
        &self,
        descriptor: &RequestDescriptor,
        force_rebuild: bool,
    ) -> Result<GeneratedArtifact> {
        let code = self.generator.generate(descriptor, force_rebuild).await?;

        let tests = match self.tests.generate(&code, descriptor).await {
            Ok(tests) => Some(tests),
            Err(PromptcError::NotImplemented(what)) => {
                if !self.tests_unavailable_logged.swap(true, Ordering::Relaxed) {
                    debug!(what, "test generation unavailable, emitting code only");
                }
                None
            }
            Err(e) => return Err(e),
        };

        Ok(GeneratedArtifact { code, tests })
    }

    /// Read a YAML prompt file and compile it.
    pub async fn compile_file(
        &self,
        path: impl AsRef<Path>,
        force_rebuild: bool,
    ) -> Result<GeneratedArtifact> {
        let descriptor = RequestDescriptor::read(path.as_ref())?;
        self.compile(&descriptor, force_rebuild).await
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("generator", &self.generator)
            .field("tests", &self.tests)
            .finish()
    }
}

/// Generates tests for produced code.
///
/// The prompt is defined ([`TestTemplate`]) but no backend call is made
/// yet: [`generate`](Self::generate) always reports
/// [`PromptcError::NotImplemented`].
pub struct TestGenerator {
    template: Arc<dyn PromptTemplate>,
}

impl std::fmt::Debug for TestGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestGenerator").finish_non_exhaustive()
    }
}

impl Default for TestGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGenerator {
    pub fn new() -> Self {
        Self {
            template: Arc::new(TestTemplate),
        }
    }

    /// Render the test prompt for `code` generated from `descriptor`.
    pub fn prompt(&self, code: &str, descriptor: &RequestDescriptor) -> Result<String> {
        self.template
            .render(&descriptor.clone().with("code", code))
    }

    pub async fn generate(&self, _code: &str, _descriptor: &RequestDescriptor) -> Result<String> {
        Err(PromptcError::NotImplemented("test generation"))
    }
}
