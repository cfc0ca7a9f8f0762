//! Gatekeeper error types

use eltariff_domain::{Violation, ViolationCode};
use std::fmt;

/// Every violation found in one document
///
/// Notes from normalization are carried along so a failed document can
/// still explain what was rewritten before it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Violations in discovery order
    pub violations: Vec<Violation>,

    /// Normalization notes
    pub notes: Vec<String>,
}

impl ValidationReport {
    /// Create a report
    pub fn new(violations: Vec<Violation>, notes: Vec<String>) -> Self {
        Self { violations, notes }
    }

    /// Whether any violation carries the code
    pub fn has(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// Codes of all violations, in order
    pub fn codes(&self) -> Vec<ViolationCode> {
        self.violations.iter().map(|v| v.code).collect()
    }

    /// Number of violations
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether the report holds no violations
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_lists_each_violation() {
        let report = ValidationReport::new(
            vec![
                Violation::new("tariffs[0].companyName", ViolationCode::MissingField, "required field is missing"),
                Violation::new("tariffs[0].companyOrgNo", ViolationCode::MissingField, "required field is missing"),
            ],
            Vec::new(),
        );
        let text = report.to_string();
        assert!(text.starts_with("2 schema violation(s)"));
        assert!(text.contains("tariffs[0].companyOrgNo: required field is missing (missing_field)"));
        assert!(report.has(ViolationCode::MissingField));
        assert!(!report.has(ViolationCode::VatMismatch));
    }
}
