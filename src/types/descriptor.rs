//! Request descriptors: the structured input of one compile operation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PromptcError, Result};

/// Language assumed when a descriptor does not name one.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Structured description of the code to generate.
///
/// A mapping of string keys to JSON-like values. Recognised keys are
/// `name`, `description`, `template`, `requirements`, `required_elements`
/// and `language`; any other key is carried along and rendered into the
/// prompt context unchanged.
///
/// Keys are held in a `BTreeMap`, so two descriptors built in different
/// insertion orders compare equal and serialize identically.
///
/// ```rust
/// # use promptc::RequestDescriptor;
/// let descriptor = RequestDescriptor::new()
///     .with("name", "greeter")
///     .with("description", "Say hello")
///     .with("required_elements", vec!["def hello("]);
/// assert_eq!(descriptor.language(), "python");
/// assert_eq!(descriptor.required_elements(), vec!["def hello("]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestDescriptor(BTreeMap<String, Value>);

impl RequestDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, returning the descriptor (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a key, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Descriptor name, used for output file stems and logging.
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Target language, defaulting to [`DEFAULT_LANGUAGE`].
    pub fn language(&self) -> &str {
        self.get_str("language").unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Literal substrings the generated code must contain.
    ///
    /// Non-string list members are ignored; a missing or non-list value
    /// yields an empty list.
    pub fn required_elements(&self) -> Vec<&str> {
        self.0
            .get("required_elements")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Canonical JSON serialization: object keys sorted at every depth,
    /// no insignificant whitespace.
    ///
    /// Nested objects are rebuilt in sorted order explicitly, so the output
    /// does not depend on whether `serde_json` preserves insertion order.
    pub fn canonical_json(&self) -> String {
        let mut root = Map::new();
        for (key, value) in &self.0 {
            root.insert(key.clone(), canonicalize(value));
        }
        Value::Object(root).to_string()
    }

    /// Parse a YAML prompt document.
    ///
    /// The document root must be a mapping with string keys.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| PromptcError::InvalidInput(format!("failed to parse prompt: {e}")))?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(PromptcError::InvalidInput(format!(
                "prompt must be a mapping, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Read and parse a YAML prompt file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PromptcError::InvalidInput(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }
}

impl From<BTreeMap<String, Value>> for RequestDescriptor {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for RequestDescriptor {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
