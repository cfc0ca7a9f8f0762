//! Error types for the CLI application.

use eltariff_domain::{ErrorKind, ViolationCode};
use eltariff_extractor::ExtractorError;
use eltariff_gatekeeper::ValidationReport;
use eltariff_generator::GeneratorError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction failed
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Document did not validate
    #[error("{0}")]
    Invalid(#[from] ValidationReport),

    /// Package generation failed
    #[error(transparent)]
    Generation(#[from] GeneratorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Failure kind, for the library failures
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Extraction(e) => Some(e.kind()),
            CliError::Invalid(report) if report.has(ViolationCode::UnsupportedSchemaVersion) => {
                Some(ErrorKind::UnsupportedSchemaVersion)
            }
            CliError::Invalid(_) => Some(ErrorKind::SchemaValidationFailed),
            CliError::Generation(e) => Some(e.kind()),
            CliError::InvalidInput(_) => Some(ErrorKind::InvalidRequest),
            _ => None,
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            Some(ErrorKind::SchemaValidationFailed) => 3,
            Some(ErrorKind::BackendUnavailable) => 4,
            Some(ErrorKind::ModelOutputMalformed) => 5,
            Some(ErrorKind::MergeConflictUnresolved) => 6,
            Some(ErrorKind::UnsupportedSchemaVersion) => 7,
            Some(ErrorKind::InvalidRequest) | None => match self {
                CliError::Config(_) | CliError::Toml(_) => 2,
                _ => 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eltariff_domain::BackendError;

    #[test]
    fn test_exit_codes_follow_kind() {
        let unavailable = CliError::from(ExtractorError::BackendUnavailable {
            attempts: 4,
            retryable: true,
            source: BackendError::Timeout,
        });
        assert_eq!(unavailable.kind(), Some(ErrorKind::BackendUnavailable));
        assert_eq!(unavailable.exit_code(), 4);

        assert_eq!(CliError::Config("x".into()).exit_code(), 2);
        assert_eq!(CliError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(CliError::Invalid(ValidationReport::new(Vec::new(), Vec::new())).exit_code(), 3);
    }
}
