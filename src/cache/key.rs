//! Cache key derivation using SHA256 hashing

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::RequestDescriptor;

/// Content address of a request descriptor.
///
/// Lowercase hex SHA-256 of the descriptor's canonical JSON
/// (see [`RequestDescriptor::canonical_json`]). Equal descriptors always
/// map to equal keys, whatever order their keys were inserted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a descriptor.
    pub fn for_descriptor(descriptor: &RequestDescriptor) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(descriptor.canonical_json().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
