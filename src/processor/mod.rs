//! Post-processing of raw model output.
//!
//! [`ResponseProcessor::process`] turns free-form model text into code:
//!
//! 1. [`extract_code`] pulls the first fenced block (or keeps the text),
//! 2. a [`CodeFormatter`] normalizes whitespace and indentation,
//! 3. the descriptor's `required_elements` are checked against the result.

pub mod extract;
pub mod format;

pub use extract::extract_code;
pub use format::{CodeFormatter, PythonFormatter};

use std::sync::Arc;

use tracing::debug;

use crate::types::RequestDescriptor;
use crate::{PromptcError, Result};

/// Extracts, normalizes and validates model responses.
#[derive(Clone)]
pub struct ResponseProcessor {
    formatter: Arc<dyn CodeFormatter>,
}

impl Default for ResponseProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseProcessor {
    /// Processor using [`PythonFormatter`].
    pub fn new() -> Self {
        Self::with_formatter(Arc::new(PythonFormatter))
    }

    pub fn with_formatter(formatter: Arc<dyn CodeFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &dyn CodeFormatter {
        self.formatter.as_ref()
    }

    /// Extract and normalize `raw`, then check it contains every required
    /// element named by `descriptor`.
    ///
    /// Fails with [`PromptcError::ValidationFailed`] naming the first
    /// element (in descriptor order) that is missing.
    pub fn process(&self, raw: &str, descriptor: &RequestDescriptor) -> Result<String> {
        let code = self.formatter.format(extract_code(raw));
        validate(&code, descriptor)?;
        debug!(
            raw_len = raw.len(),
            code_len = code.len(),
            formatter = self.formatter.language(),
            "response processed"
        );
        Ok(code)
    }
}

/// Check `code` against the descriptor's `required_elements`.
///
/// Matching is plain substring containment. An absent or empty list passes.
pub fn validate(code: &str, descriptor: &RequestDescriptor) -> Result<()> {
    match descriptor
        .required_elements()
        .into_iter()
        .find(|element| !code.contains(element))
    {
        Some(missing) => Err(PromptcError::ValidationFailed {
            element: missing.to_string(),
        }),
        None => Ok(()),
    }
}

impl std::fmt::Debug for ResponseProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseProcessor")
            .field("formatter", &self.formatter.language())
            .finish()
    }
}
