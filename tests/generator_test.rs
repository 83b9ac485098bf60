//! Tests for the generation pipeline: caching, refresh and failure paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use promptc::{
    CacheStore, CodeGenerator, GenerateOptions, ModelAdapter, PromptcError, RequestDescriptor,
    Result,
};
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Mock adapters
// ============================================================================

/// Replies with the next text from a script and counts calls.
struct ScriptedAdapter {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.replies[n.min(self.replies.len() - 1)].clone())
    }
}

/// Always fails like a broken backend.
struct FailingAdapter;

#[async_trait]
impl ModelAdapter for FailingAdapter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
        Err(PromptcError::Backend {
            backend: "failing".into(),
            message: "HTTP 503: unavailable".into(),
        })
    }
}

fn descriptor() -> RequestDescriptor {
    RequestDescriptor::new()
        .with("name", "f")
        .with("description", "a function")
        .with("required_elements", json!(["def f("]))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn second_generate_is_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = ScriptedAdapter::new(&["```python\ndef f():\n    pass\n```", "def f():\n    other"]);
    let generator = CodeGenerator::new(adapter.clone(), CacheStore::file(temp_dir.path()).unwrap());

    let first = generator.generate(&descriptor(), false).await.unwrap();
    let second = generator.generate(&descriptor(), false).await.unwrap();

    assert_eq!(first, "def f():\n    pass");
    assert_eq!(first, second);
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn cache_is_shared_across_generators() {
    let temp_dir = TempDir::new().unwrap();
    let first_adapter = ScriptedAdapter::new(&["def f():\n    pass"]);
    CodeGenerator::new(first_adapter, CacheStore::file(temp_dir.path()).unwrap())
        .generate(&descriptor(), false)
        .await
        .unwrap();

    let second_adapter = ScriptedAdapter::new(&["def f():\n    changed"]);
    let out = CodeGenerator::new(second_adapter.clone(), CacheStore::file(temp_dir.path()).unwrap())
        .generate(&descriptor(), false)
        .await
        .unwrap();

    assert_eq!(out, "def f():\n    pass");
    assert_eq!(second_adapter.calls(), 0);
}

#[tokio::test]
async fn force_rebuild_calls_backend_and_refreshes_cache() {
    let adapter = ScriptedAdapter::new(&["def f():\n    return 1", "def f():\n    return 2"]);
    let cache = CacheStore::in_memory();
    let generator = CodeGenerator::new(adapter.clone(), cache.clone());

    generator.generate(&descriptor(), false).await.unwrap();
    let forced = generator.generate(&descriptor(), true).await.unwrap();

    assert_eq!(forced, "def f():\n    return 2");
    assert_eq!(adapter.calls(), 2);
    assert_eq!(cache.lookup(&descriptor()).as_deref(), Some("def f():\n    return 2"));
}

#[tokio::test]
async fn validation_failure_names_element_and_skips_cache() {
    let adapter = ScriptedAdapter::new(&["```python\ndef g():\n    pass\n```"]);
    let cache = CacheStore::in_memory();
    let generator = CodeGenerator::new(adapter.clone(), cache.clone());

    let err = generator.generate(&descriptor(), false).await.unwrap_err();

    assert!(matches!(err, PromptcError::ValidationFailed { ref element } if element == "def f("));
    assert_eq!(cache.lookup(&descriptor()), None);

    // Nothing was cached, so the next call asks the backend again.
    let _ = generator.generate(&descriptor(), false).await;
    assert_eq!(adapter.calls(), 2);
}

#[tokio::test]
async fn backend_failure_propagates_and_skips_cache() {
    let cache = CacheStore::in_memory();
    let generator = CodeGenerator::new(Arc::new(FailingAdapter), cache.clone());

    let err = generator.generate(&descriptor(), false).await.unwrap_err();

    assert!(matches!(err, PromptcError::Backend { .. }));
    assert_eq!(cache.lookup(&descriptor()), None);
}

#[tokio::test]
async fn different_descriptors_do_not_share_entries() {
    let adapter = ScriptedAdapter::new(&["def f():\n    return 1", "def f():\n    return 2"]);
    let generator = CodeGenerator::new(adapter.clone(), CacheStore::in_memory());

    let a = generator.generate(&descriptor(), false).await.unwrap();
    let b = generator
        .generate(&descriptor().with("language", "python"), false)
        .await
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(adapter.calls(), 2);
}

#[tokio::test]
async fn empty_fenced_block_is_empty_response_and_not_cached() {
    let adapter = ScriptedAdapter::new(&["```python\n```"]);
    let cache = CacheStore::in_memory();
    let generator = CodeGenerator::new(adapter.clone(), cache.clone());
    let descriptor = RequestDescriptor::new().with("name", "f");

    let err = generator.generate(&descriptor, false).await.unwrap_err();

    assert!(matches!(err, PromptcError::EmptyResponse));
    assert_eq!(cache.lookup(&descriptor), None);
}
