//! End-to-end tests for the compile operation.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use promptc::{
    Compiler, GenerateOptions, ModelAdapter, PromptcError, RequestDescriptor, Result,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CountingAdapter {
    calls: AtomicUsize,
}

#[async_trait]
impl ModelAdapter for CountingAdapter {
    fn name(&self) -> &str {
        "counting"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("```python\ndef greet(name):\nreturn f\"hi {name}\"\n```".to_string())
    }
}

const PROMPT_FILE: &str = r#"
name: greet
description: Greet someone by name
language: python
requirements:
  - Return a string
required_elements:
  - "def greet("
"#;

#[tokio::test]
async fn compile_returns_code_without_tests() {
    let adapter = Arc::new(CountingAdapter {
        calls: AtomicUsize::new(0),
    });
    let compiler = Compiler::builder()
        .adapter(adapter.clone())
        .memory_cache()
        .build()
        .unwrap();

    let descriptor = RequestDescriptor::from_yaml_str(PROMPT_FILE).unwrap();
    let artifact = compiler.compile(&descriptor, false).await.unwrap();

    assert_eq!(artifact.code, "def greet(name):\n    return f\"hi {name}\"");
    assert_eq!(artifact.tests, None);

    // Second compile is served from the cache.
    let again = compiler.compile(&descriptor, false).await.unwrap();
    assert_eq!(again, artifact);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn compile_file_reads_yaml() {
    let temp_dir = TempDir::new().unwrap();
    let prompt_path = temp_dir.path().join("greet.yaml");
    fs::write(&prompt_path, PROMPT_FILE).unwrap();

    let adapter = Arc::new(CountingAdapter {
        calls: AtomicUsize::new(0),
    });
    let compiler = Compiler::builder()
        .adapter(adapter)
        .cache_dir(temp_dir.path().join("cache"))
        .build()
        .unwrap();

    let artifact = compiler.compile_file(&prompt_path, false).await.unwrap();
    assert!(artifact.code.starts_with("def greet(name):"));

    // One record on disk.
    let records = fs::read_dir(temp_dir.path().join("cache")).unwrap().count();
    assert_eq!(records, 1);
}

#[tokio::test]
async fn compile_file_missing_is_invalid_input() {
    let compiler = Compiler::builder()
        .adapter(Arc::new(CountingAdapter {
            calls: AtomicUsize::new(0),
        }))
        .memory_cache()
        .build()
        .unwrap();

    let err = compiler
        .compile_file("/nonexistent/prompt.yaml", false)
        .await
        .unwrap_err();
    assert!(matches!(err, PromptcError::InvalidInput(_)));
    assert!(err.to_string().contains("/nonexistent/prompt.yaml"));
}

#[tokio::test]
async fn compile_file_rejects_non_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let prompt_path = temp_dir.path().join("list.yaml");
    fs::write(&prompt_path, "- a\n- b\n").unwrap();

    let compiler = Compiler::builder()
        .adapter(Arc::new(CountingAdapter {
            calls: AtomicUsize::new(0),
        }))
        .memory_cache()
        .build()
        .unwrap();

    let err = compiler.compile_file(&prompt_path, false).await.unwrap_err();
    assert!(matches!(err, PromptcError::InvalidInput(_)));
}

/// Full stack against a mocked OpenAI endpoint.
#[tokio::test]
async fn compile_through_openai_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Here you go:\n```python\ndef greet(name):\n    return name\n```"
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let compiler = Compiler::builder()
        .openai("test_key")
        .base_url(mock_server.uri())
        .memory_cache()
        .build()
        .unwrap();

    let descriptor = RequestDescriptor::from_yaml_str(PROMPT_FILE).unwrap();
    let first = compiler.compile(&descriptor, false).await.unwrap();
    let second = compiler.compile(&descriptor, false).await.unwrap();

    assert_eq!(first.code, "def greet(name):\n    return name");
    assert_eq!(first, second);
}
