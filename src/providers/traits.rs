//! The model adapter seam.
//!
//! Every text-generation backend implements [`ModelAdapter`]. The backend
//! is chosen once, at configuration time, and then used through
//! `Arc<dyn ModelAdapter>`; nothing downstream inspects the concrete type.
//!
//! # Contract
//!
//! - `generate` consults the adapter's own rate window before issuing a
//!   request and returns `RateLimited` when the window is full.
//! - Backend failures come back as `Backend`; a rate-limit signal from the
//!   backend itself is remapped to `RateLimited`.
//! - `validate` is a minimal sanity check on backend text. Real validation
//!   belongs to the [`ResponseProcessor`](crate::processor::ResponseProcessor).
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl ModelAdapter for EchoAdapter {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String> {
//!         Ok(prompt.to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::GenerateOptions;

/// Uniform interface to a remote text-generation backend.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Backend identifier for logging, metrics and errors (e.g. `openai:gpt-4`).
    fn name(&self) -> &str;

    /// Send a prompt and return the backend's free-form text.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Minimal check on backend text: false for empty or whitespace-only text.
    fn validate(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAdapter;

    #[async_trait]
    impl ModelAdapter for EchoAdapter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn default_validate_rejects_blank_text() {
        let adapter = EchoAdapter;
        assert!(!adapter.validate(""));
        assert!(!adapter.validate("  \n\t "));
        assert!(adapter.validate("def f(): pass"));
    }

    #[tokio::test]
    async fn adapter_is_usable_as_trait_object() {
        let adapter: std::sync::Arc<dyn ModelAdapter> = std::sync::Arc::new(EchoAdapter);
        let text = adapter
            .generate("hello", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "hello");
        assert_eq!(adapter.name(), "echo");
    }
}
