//! promptc - compile structured prompt files into source code
//!
//! A prompt file is a YAML mapping (a [`RequestDescriptor`]) naming what to
//! build. The [`Compiler`] renders it into a prompt, sends it to a language
//! model through a [`ModelAdapter`], extracts and normalizes the code in the
//! reply, checks it for required elements, and caches the result under a
//! content hash of the descriptor. Compiling the same descriptor again is
//! served from the cache without a backend call.
//!
//! # Example
//!
//! ```rust,no_run
//! use promptc::{Compiler, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> promptc::Result<()> {
//!     let compiler = Compiler::builder()
//!         .openai("sk-your-key")
//!         .cache_dir(".cache")
//!         .build()?;
//!
//!     let descriptor = RequestDescriptor::new()
//!         .with("name", "slugify")
//!         .with("description", "Turn a title into a URL slug")
//!         .with("required_elements", vec!["def slugify("]);
//!
//!     let artifact = compiler.compile(&descriptor, false).await?;
//!     println!("{}", artifact.code);
//!     Ok(())
//! }
//! ```
//!
//! # Rate limits
//!
//! Each adapter enforces its own sliding-window quota (default 50 calls per
//! minute) and reports exhaustion as [`PromptcError::RateLimited`] with a
//! retry hint. The pipeline never retries on its own; wrap calls in
//! [`with_retry`] to wait out the hint.

pub mod cache;
pub mod compiler;
#[cfg(feature = "cli")]
pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod processor;
pub mod providers;
pub mod retry;
pub mod telemetry;
pub mod template;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheBackend, CacheConfig, CacheKey, CacheStore, FileBackend, MemoryBackend};
pub use compiler::{Compiler, CompilerBuilder, TestGenerator};
#[cfg(feature = "cli")]
pub use config::Config;
pub use error::{PromptcError, Result};
pub use generator::CodeGenerator;
pub use output::{OutputFormat, write_artifact};
pub use processor::{CodeFormatter, PythonFormatter, ResponseProcessor};
pub use providers::{Backend, ModelAdapter, RateLimitConfig};
pub use retry::{RetryConfig, with_retry};
pub use template::{CodeTemplate, PromptTemplate, TestTemplate};
pub use types::{GenerateOptions, GeneratedArtifact, RequestDescriptor};
pub use version::PKG_VERSION;
