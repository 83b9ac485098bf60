//! HTTP plumbing shared by the backend adapters.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::PromptcError;

/// Request timeout applied to every backend call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest slice of an error body quoted in a `Backend` error.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

/// Map a transport failure to `Backend`.
pub(crate) fn transport_error(backend: &str, err: reqwest::Error) -> PromptcError {
    PromptcError::Backend {
        backend: backend.to_owned(),
        message: err.to_string(),
    }
}

/// Pass successful responses through; map everything else to an error.
///
/// HTTP 429, or any error body that talks about a rate limit, becomes
/// `RateLimited` with the `retry-after` header (seconds) as the hint.
/// Other statuses become `Backend` quoting the status and body.
pub(crate) async fn check_status(
    backend: &str,
    response: Response,
) -> Result<Response, PromptcError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 || body.to_lowercase().contains("rate limit") {
        return Err(PromptcError::RateLimited {
            backend: backend.to_owned(),
            retry_after,
        });
    }

    Err(PromptcError::Backend {
        backend: backend.to_owned(),
        message: format!("HTTP {}: {}", status.as_u16(), truncate(&body)),
    })
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY);
        let cut = truncate(&body);
        assert!(cut.len() <= MAX_ERROR_BODY);
        assert!(body.starts_with(cut));
        assert_eq!(truncate("short"), "short");
    }
}
