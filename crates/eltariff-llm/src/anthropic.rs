//! Anthropic Backend Implementation
//!
//! Calls the Anthropic Messages API. Structured output is obtained by
//! declaring a single tool whose `input_schema` is the requested output
//! schema and forcing the model to call it; the tool input is returned as
//! the raw output text.
//!
//! # Examples
//!
//! ```no_run
//! use eltariff_llm::AnthropicBackend;
//!
//! let backend = AnthropicBackend::new("sk-ant-...")
//!     .with_model("claude-sonnet-4-20250514");
//! ```

use crate::{classify_status, classify_transport, retry_after_header};
use async_trait::async_trait;
use eltariff_domain::traits::{BackendError, ModelBackend, ModelRequest};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Default timeout for one request (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Anthropic Messages API backend
pub struct AnthropicBackend {
    endpoint: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    ToolUse { input: Value },
    #[serde(other)]
    Other,
}

impl AnthropicBackend {
    /// Create a backend with the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: SecretString::from(api_key.into()),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a backend from a key already held as a secret
    pub fn from_secret(api_key: SecretString) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Model this backend calls
    pub fn model(&self) -> &str {
        &self.model
    }

    fn body<'a>(&'a self, request: &'a ModelRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            tools: vec![Tool {
                name: &request.schema_name,
                description: "Record the extracted tariff document",
                input_schema: &request.output_schema,
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: &request.schema_name,
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

/// Pull the structured output out of a response
fn extract_output(response: MessagesResponse) -> Result<String, BackendError> {
    let mut text = None;
    for block in response.content {
        match block {
            ContentBlock::ToolUse { input } => return Ok(input.to_string()),
            ContentBlock::Text { text: t } if text.is_none() => text = Some(t),
            _ => {}
        }
    }
    text.ok_or_else(|| {
        BackendError::InvalidResponse(format!(
            "No tool call or text in response (stop reason: {})",
            response.stop_reason.as_deref().unwrap_or("unknown")
        ))
    })
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, BackendError> {
        let url = format!("{}/v1/messages", self.endpoint.trim_end_matches('/'));
        debug!("Calling {} with model {}", url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&self.body(request))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), retry_after, body));
        }

        let parsed = response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        extract_output(parsed)
    }
}
