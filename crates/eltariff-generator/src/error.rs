//! Error types for package generation

use eltariff_domain::ErrorKind;
use eltariff_gatekeeper::ValidationReport;
use thiserror::Error;

/// Errors that can occur while generating a package
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// No template exists for the model's schema version
    #[error("No package template for schema version {version} (supported: {})", supported.join(", "))]
    UnsupportedSchemaVersion {
        /// Version the model is tagged with
        version: String,
        /// Versions with a template
        supported: Vec<String>,
    },

    /// The model no longer passes validation
    #[error("Model failed validation: {0}")]
    InvalidModel(ValidationReport),

    /// Rendering a JSON artifact failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GeneratorError {
    /// Failure kind for callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneratorError::UnsupportedSchemaVersion { .. } => ErrorKind::UnsupportedSchemaVersion,
            GeneratorError::InvalidModel(_) => ErrorKind::SchemaValidationFailed,
            GeneratorError::Serialization(_) => ErrorKind::InvalidRequest,
        }
    }
}
