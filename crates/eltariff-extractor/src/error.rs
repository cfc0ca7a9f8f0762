//! Error types for the Extractor

use crate::merge::MergeConflict;
use eltariff_domain::{BackendError, ErrorKind};
use eltariff_gatekeeper::ValidationReport;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Output never matched the structured-output contract
    #[error("Model output malformed after {attempts} attempt(s): {detail}")]
    ModelOutputMalformed {
        /// Model attempts made
        attempts: u32,
        /// Last parse failure
        detail: String,
        /// Last raw output
        raw_output: String,
    },

    /// Output parsed but broke schema rules
    #[error("Schema validation failed: {report}")]
    SchemaValidationFailed {
        /// Every violation found
        report: ValidationReport,
        /// Raw output the document came from
        raw_output: Option<String>,
    },

    /// Backend could not be reached, or refused the request
    #[error("Backend unavailable after {attempts} call(s): {source}")]
    BackendUnavailable {
        /// Backend calls made
        attempts: u32,
        /// Whether resubmitting later may help
        retryable: bool,
        /// Last backend failure
        #[source]
        source: BackendError,
    },

    /// Sources of equal priority disagree
    #[error("Merge conflict unresolved: {} field(s) disagree", conflicts.len())]
    MergeConflictUnresolved {
        /// Every conflicting field with all values
        conflicts: Vec<MergeConflict>,
    },

    /// Request rejected before any model call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Failure kind for callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractorError::ModelOutputMalformed { .. } => ErrorKind::ModelOutputMalformed,
            ExtractorError::SchemaValidationFailed { .. } => ErrorKind::SchemaValidationFailed,
            ExtractorError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            ExtractorError::MergeConflictUnresolved { .. } => ErrorKind::MergeConflictUnresolved,
            ExtractorError::InvalidRequest(_) | ExtractorError::Config(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Raw model output behind the failure, when there was one
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractorError::ModelOutputMalformed { raw_output, .. } => Some(raw_output),
            ExtractorError::SchemaValidationFailed { raw_output, .. } => raw_output.as_deref(),
            _ => None,
        }
    }

    /// Whether the caller may resubmit the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractorError::BackendUnavailable { retryable: true, .. })
    }

    /// Validation report, for schema failures
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ExtractorError::SchemaValidationFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let malformed = ExtractorError::ModelOutputMalformed {
            attempts: 3,
            detail: "expected a JSON object".to_string(),
            raw_output: "Sorry, I cannot".to_string(),
        };
        assert_eq!(malformed.kind(), ErrorKind::ModelOutputMalformed);
        assert_eq!(malformed.raw_output(), Some("Sorry, I cannot"));
        assert!(!malformed.is_retryable());

        let unavailable = ExtractorError::BackendUnavailable {
            attempts: 4,
            retryable: true,
            source: BackendError::Timeout,
        };
        assert_eq!(unavailable.kind(), ErrorKind::BackendUnavailable);
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("after 4 call(s)"));

        assert_eq!(
            ExtractorError::Config("bad".to_string()).kind(),
            ErrorKind::InvalidRequest
        );
    }
}
