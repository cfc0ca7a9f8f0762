//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for normalization and validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute VAT tolerance, in currency units
    pub vat_tolerance_abs: f64,

    /// Relative VAT tolerance, as a fraction of the inc-VAT amount
    pub vat_tolerance_rel: f64,

    /// VAT rate applied when a price declares none
    pub default_vat_rate: f64,

    /// Keep unknown fields as extensions where the schema allows them
    pub allow_extensions: bool,

    /// Report gaps between consecutive seasonal components
    pub require_seasonal_coverage: bool,

    /// Check that fixed fees carry no unit and a priced period
    pub validate_units: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            vat_tolerance_abs: 0.01,
            vat_tolerance_rel: 0.0,
            default_vat_rate: 0.25,
            allow_extensions: true,
            require_seasonal_coverage: true,
            validate_units: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (rounding noise tolerated, no coverage rule)
    pub fn permissive() -> Self {
        Self {
            vat_tolerance_abs: 0.05,
            vat_tolerance_rel: 0.001,
            require_seasonal_coverage: false,
            ..Self::default()
        }
    }

    /// Create a strict configuration (extensions forbidden, all rules enabled)
    pub fn strict() -> Self {
        Self {
            vat_tolerance_abs: 0.005,
            allow_extensions: false,
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.vat_tolerance_abs.is_nan() || self.vat_tolerance_abs < 0.0 {
            return Err("vat_tolerance_abs must be non-negative".to_string());
        }
        if !(0.0..1.0).contains(&self.vat_tolerance_rel) {
            return Err("vat_tolerance_rel must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..1.0).contains(&self.default_vat_rate) {
            return Err("default_vat_rate must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }

    /// Whether an inc-VAT amount agrees with the ex-VAT amount and rate
    pub fn vat_consistent(&self, ex_vat: f64, inc_vat: f64, rate: f64) -> bool {
        let expected = ex_vat * (1.0 + rate);
        (inc_vat - expected).abs() <= self.vat_tolerance_abs + self.vat_tolerance_rel * inc_vat.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.vat_tolerance_abs, 0.01);
        assert_eq!(config.default_vat_rate, 0.25);
        assert!(config.allow_extensions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert!(!config.require_seasonal_coverage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert!(!config.allow_extensions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ValidationConfig {
            default_vat_rate: 1.5,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vat_consistency() {
        let config = ValidationConfig::default();
        assert!(config.vat_consistent(100.0, 125.0, 0.25));
        assert!(config.vat_consistent(100.0, 125.009, 0.25));
        assert!(!config.vat_consistent(100.0, 140.0, 0.25));
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: ValidationConfig = toml::from_str("vat_tolerance_abs = 0.02").unwrap();
        assert_eq!(config.vat_tolerance_abs, 0.02);
        assert_eq!(config.default_vat_rate, 0.25);
    }
}
