//! Violations and error kinds shared across the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable category of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Model output could not be parsed as a tariff document
    ModelOutputMalformed,
    /// Document parsed but breaks schema or semantic rules
    SchemaValidationFailed,
    /// Model backend could not be reached
    BackendUnavailable,
    /// No template exists for the requested schema version
    UnsupportedSchemaVersion,
    /// Sources disagree and no priority rule decides
    MergeConflictUnresolved,
    /// The request itself was unusable
    InvalidRequest,
}

impl ErrorKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ModelOutputMalformed => "model_output_malformed",
            ErrorKind::SchemaValidationFailed => "schema_validation_failed",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::UnsupportedSchemaVersion => "unsupported_schema_version",
            ErrorKind::MergeConflictUnresolved => "merge_conflict_unresolved",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule a violation breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// Required field absent
    MissingField,
    /// Value of the wrong JSON type or format
    WrongType,
    /// Value outside a closed set
    InvalidEnum,
    /// Field not in the schema where extensions are not allowed
    UnknownField,
    /// Inc-VAT amount disagrees with ex-VAT amount and rate
    VatMismatch,
    /// VAT rate outside [0, 1]
    InvalidVatRate,
    /// Negative or non-finite amount
    InvalidAmount,
    /// Unit inconsistent with the price element
    UnitMismatch,
    /// Peak component without peak settings
    MissingPeakSettings,
    /// Not an ISO 8601 duration
    InvalidDuration,
    /// Validity window with end not after start
    InvalidPeriod,
    /// Component window outside tariff validity
    PeriodOutsideTariff,
    /// Active periods overlapping within one component
    WindowOverlap,
    /// Seasonal components leave a gap between each other
    CoverageGap,
    /// Calendar pattern reference that resolves to nothing
    UnknownCalendarPattern,
    /// Identifier used twice in one scope
    DuplicateId,
    /// Tariff without any price component
    NoComponents,
    /// Required text empty
    EmptyValue,
    /// Schema version not supported
    UnsupportedSchemaVersion,
}

impl ViolationCode {
    /// Get the code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::MissingField => "missing_field",
            ViolationCode::WrongType => "wrong_type",
            ViolationCode::InvalidEnum => "invalid_enum",
            ViolationCode::UnknownField => "unknown_field",
            ViolationCode::VatMismatch => "vat_mismatch",
            ViolationCode::InvalidVatRate => "invalid_vat_rate",
            ViolationCode::InvalidAmount => "invalid_amount",
            ViolationCode::UnitMismatch => "unit_mismatch",
            ViolationCode::MissingPeakSettings => "missing_peak_settings",
            ViolationCode::InvalidDuration => "invalid_duration",
            ViolationCode::InvalidPeriod => "invalid_period",
            ViolationCode::PeriodOutsideTariff => "period_outside_tariff",
            ViolationCode::WindowOverlap => "window_overlap",
            ViolationCode::CoverageGap => "coverage_gap",
            ViolationCode::UnknownCalendarPattern => "unknown_calendar_pattern",
            ViolationCode::DuplicateId => "duplicate_id",
            ViolationCode::NoComponents => "no_components",
            ViolationCode::EmptyValue => "empty_value",
            ViolationCode::UnsupportedSchemaVersion => "unsupported_schema_version",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken rule, located by JSON path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path in wire names, e.g. `tariffs[0].energyPrice.components[1].price`
    pub path: String,

    /// Rule broken
    pub code: ViolationCode,

    /// Human-readable explanation
    pub message: String,
}

impl Violation {
    /// Create a violation
    pub fn new(path: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "$" } else { &self.path };
        write!(f, "{}: {} ({})", path, self.message, self.code)
    }
}
