//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Backend implementations live in eltariff-llm.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Caller turn
    User,
    /// Model turn
    Assistant,
}

impl Role {
    /// Get the role name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl ChatMessage {
    /// Caller turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Model turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One request for structured output
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// System instructions
    pub system: String,

    /// Conversation so far; the last turn is the caller's
    pub messages: Vec<ChatMessage>,

    /// Name of the structured output
    pub schema_name: String,

    /// JSON Schema the output must conform to
    pub output_schema: Value,

    /// Output budget
    pub max_tokens: u32,
}

/// Backend failures, classified for retry decisions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// No response within the call timeout
    #[error("Backend call timed out")]
    Timeout,

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend asked the caller to slow down
    #[error("Rate limited by backend")]
    RateLimited {
        /// Wait suggested by the backend
        retry_after: Option<Duration>,
    },

    /// Backend-side failure
    #[error("Backend server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Backend message
        message: String,
    },

    /// Request refused; retrying cannot help
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// Response envelope could not be read
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether the same request may succeed if retried
    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::Rejected(_))
    }

    /// Wait suggested by the backend, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Trait for model backends producing structured output
///
/// Implemented by the infrastructure layer (eltariff-llm). One call is one
/// attempt; retry policy belongs to the caller.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Send one request and return the raw structured output text
    async fn complete(&self, request: &ModelRequest) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Timeout.is_retryable());
        assert!(BackendError::Server {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
        assert!(!BackendError::Rejected("bad key".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let limited = BackendError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(BackendError::Timeout.retry_after(), None);
    }
}
