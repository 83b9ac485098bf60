//! Public types for the promptc API.

mod artifact;
mod descriptor;
mod options;

pub use artifact::GeneratedArtifact;
pub use descriptor::{DEFAULT_LANGUAGE, RequestDescriptor};
pub use options::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerateOptions};
