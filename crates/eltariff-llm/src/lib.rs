//! Eltariff Model Backend Layer
//!
//! Pluggable structured-output backends behind the `ModelBackend` trait from
//! `eltariff-domain`.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic scripted backend for testing
//! - `AnthropicBackend`: Anthropic Messages API, output forced through a tool schema
//! - `OllamaBackend`: Local Ollama chat API with a JSON Schema `format`
//!
//! Every backend makes exactly one attempt per call and reports failures as
//! a classified `BackendError`. Retries and backoff are the caller's job.
//!
//! # Examples
//!
//! ```
//! use eltariff_llm::MockBackend;
//! use eltariff_domain::traits::{ModelBackend, ModelRequest};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = MockBackend::new(r#"{"tariffs": []}"#);
//! let request = ModelRequest {
//!     system: String::new(),
//!     messages: Vec::new(),
//!     schema_name: "tariff_document".to_string(),
//!     output_schema: serde_json::json!({}),
//!     max_tokens: 1024,
//! };
//! assert_eq!(backend.complete(&request).await.unwrap(), r#"{"tariffs": []}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod ollama;

use async_trait::async_trait;
use eltariff_domain::traits::{BackendError, ModelBackend, ModelRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;

/// Map a non-success HTTP status to a backend error
pub(crate) fn classify_status(
    status: u16,
    retry_after: Option<Duration>,
    body: String,
) -> BackendError {
    match status {
        429 => BackendError::RateLimited { retry_after },
        408 => BackendError::Timeout,
        500..=599 => BackendError::Server {
            status,
            message: body,
        },
        _ => BackendError::Rejected(format!("HTTP {}: {}", status, body)),
    }
}

/// Map a reqwest failure to a backend error
pub(crate) fn classify_transport(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(error.to_string())
    }
}

/// Read a `Retry-After` header given in seconds
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock backend for deterministic testing
///
/// Returns scripted outcomes in order, then the default response once the
/// script runs out. Every request is recorded so tests can inspect the
/// prompts and corrective turns that were sent.
///
/// # Examples
///
/// ```
/// use eltariff_llm::MockBackend;
/// use eltariff_domain::traits::BackendError;
///
/// let backend = MockBackend::new("{}")
///     .then_error(BackendError::Timeout)
///     .then_respond("not json");
/// assert_eq!(backend.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: String,
    script: Arc<Mutex<VecDeque<Result<String, BackendError>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock returning `response` for every call
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Queue a successful response
    pub fn then_respond(self, response: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(response.into()));
        self
    }

    /// Queue a failure
    pub fn then_error(self, error: BackendError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    /// All requests received, oldest first
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<ModelRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, BackendError> {
        *lock(&self.call_count) += 1;
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = lock(&self.script).pop_front();
        scripted.unwrap_or_else(|| Ok(self.default_response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eltariff_domain::traits::ChatMessage;

    fn request(text: &str) -> ModelRequest {
        ModelRequest {
            system: "system".to_string(),
            messages: vec![ChatMessage::user(text)],
            schema_name: "tariff_document".to_string(),
            output_schema: serde_json::json!({"type": "object"}),
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_mock_backend_default() {
        let backend = MockBackend::new("Test response");
        let result = backend.complete(&request("any")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_backend_script_order() {
        let backend = MockBackend::new("fallback")
            .then_respond("first")
            .then_error(BackendError::Timeout)
            .then_respond("third");

        assert_eq!(backend.complete(&request("a")).await.unwrap(), "first");
        assert_eq!(
            backend.complete(&request("b")).await.unwrap_err(),
            BackendError::Timeout
        );
        assert_eq!(backend.complete(&request("c")).await.unwrap(), "third");
        assert_eq!(backend.complete(&request("d")).await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_mock_backend_call_count() {
        let backend = MockBackend::new("test");
        assert_eq!(backend.call_count(), 0);

        backend.complete(&request("1")).await.unwrap();
        backend.complete(&request("2")).await.unwrap();
        assert_eq!(backend.call_count(), 2);

        backend.reset_call_count();
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_backend_records_requests() {
        let backend = MockBackend::default();
        backend.complete(&request("hello")).await.unwrap();

        let last = backend.last_request().unwrap();
        assert_eq!(last.messages[0].content, "hello");
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_clone_shares_state() {
        let first = MockBackend::new("x");
        let second = first.clone();
        first.complete(&request("1")).await.unwrap();
        assert_eq!(second.call_count(), 1);
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(429, Some(Duration::from_secs(3)), String::new()),
            BackendError::RateLimited { retry_after: Some(_) }
        ));
        assert!(matches!(
            classify_status(529, None, "overloaded".to_string()),
            BackendError::Server { status: 529, .. }
        ));
        assert!(matches!(
            classify_status(401, None, "bad key".to_string()),
            BackendError::Rejected(_)
        ));
        assert!(classify_status(503, None, String::new()).is_retryable());
        assert!(!classify_status(400, None, String::new()).is_retryable());
    }
}
