//! Ollama Backend Implementation
//!
//! Provides integration with Ollama's local chat API for running local
//! models. Structured output uses Ollama's `format` field, which accepts a
//! JSON Schema.
//!
//! # Examples
//!
//! ```no_run
//! use eltariff_llm::OllamaBackend;
//!
//! let backend = OllamaBackend::new("http://localhost:11434", "qwen2.5:14b");
//! ```

use crate::{classify_status, classify_transport, retry_after_header};
use async_trait::async_trait;
use eltariff_domain::traits::{BackendError, ModelBackend, ModelRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "qwen2.5:14b";

/// Default timeout for LLM requests (300 seconds; local models are slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama API backend for local inference
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for Ollama chat API
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    format: &'a Value,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

/// Response from Ollama chat API
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "qwen2.5:14b")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a new Ollama backend on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    fn body<'a>(&'a self, request: &'a ModelRequest) -> OllamaChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(OllamaMessage {
            role: "system",
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| OllamaMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            format: &request.output_schema,
            options: OllamaOptions {
                num_predict: request.max_tokens,
                temperature: 0.0,
            },
        }
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.endpoint.trim_end_matches('/'));
        debug!("Calling {} with model {}", url, self.model);

        let response = self
            .client
            .post(&url)
            .json(&self.body(request))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::Rejected(format!(
                "Model not available: {}",
                self.model
            )));
        }
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), retry_after, body));
        }

        response
            .json::<OllamaChatResponse>()
            .await
            .map(|r| r.message.content)
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eltariff_domain::traits::ChatMessage;
    use serde_json::json;

    fn request() -> ModelRequest {
        ModelRequest {
            system: "Extract tariffs".to_string(),
            messages: vec![ChatMessage::user("source text")],
            schema_name: "tariff_document".to_string(),
            output_schema: json!({"type": "object", "required": ["tariffs"]}),
            max_tokens: 2048,
        }
    }

    #[test]
    fn test_ollama_backend_creation() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.1");
        assert_eq!(backend.endpoint, "http://localhost:11434");
        assert_eq!(backend.model, "llama3.1");
    }

    #[test]
    fn test_ollama_backend_default_endpoint() {
        let backend = OllamaBackend::default_endpoint("mistral");
        assert_eq!(backend.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_body_carries_schema_and_system() {
        let backend = OllamaBackend::default_endpoint("llama3.1");
        let request = request();
        let body = serde_json::to_value(backend.body(&request)).unwrap();

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "source text");
        assert_eq!(body["format"]["required"], json!(["tariffs"]));
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 2048);
    }

    // Integration tests (requires running Ollama)
    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_complete_integration() {
        let backend = OllamaBackend::default_endpoint("llama3.1");
        let result = backend.complete(&request()).await;
        if let Ok(response) = result {
            assert!(!response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Use invalid endpoint to trigger error
        let backend = OllamaBackend::new("http://localhost:9", "llama3.1")
            .with_timeout(Duration::from_secs(2));

        let result = backend.complete(&request()).await;
        match result {
            Err(BackendError::Transport(_)) | Err(BackendError::Timeout) => {}
            other => panic!("Expected transport error, got {:?}", other.err()),
        }
    }
}
