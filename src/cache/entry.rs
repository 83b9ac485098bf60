//! Cache entry structure

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::key::CacheKey;
use crate::types::RequestDescriptor;

/// A stored response together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content address of `descriptor`.
    pub key: CacheKey,

    /// Request the response was generated for.
    pub descriptor: RequestDescriptor,

    /// Processed response text.
    pub response: String,

    /// When the response was stored.
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(descriptor: RequestDescriptor, response: impl Into<String>) -> Self {
        Self::created_at(descriptor, response, Utc::now())
    }

    /// Create an entry with an explicit creation time.
    pub fn created_at(
        descriptor: RequestDescriptor,
        response: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: CacheKey::for_descriptor(&descriptor),
            descriptor,
            response: response.into(),
            created_at,
        }
    }

    /// Whether more than `retention` has passed since creation at `now`.
    ///
    /// Entries stamped in the future (clock skew) are never expired.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        let Ok(retention) = TimeDelta::from_std(retention) else {
            return false;
        };
        now.signed_duration_since(self.created_at) > retention
    }

    /// Serialize to the on-disk record format (pretty JSON).
    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an on-disk record.
    pub fn from_record(record: &str) -> serde_json::Result<Self> {
        serde_json::from_str(record)
    }
}
