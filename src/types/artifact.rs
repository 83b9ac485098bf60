//! The externally visible result of one compile operation.

use serde::{Deserialize, Serialize};

/// Generated code plus (eventually) its tests.
///
/// Carries no identity beyond the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Processed, validated source code.
    pub code: String,

    /// Generated tests. `None` while test generation is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<String>,
}

impl GeneratedArtifact {
    /// Artifact with code only.
    pub fn code_only(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            tests: None,
        }
    }
}
