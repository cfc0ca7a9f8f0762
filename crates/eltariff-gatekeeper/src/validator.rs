//! Tariff document validation logic

use crate::semantic::SemanticCheck;
use crate::structure::StructureCheck;
use crate::{Normalizer, ValidationConfig, ValidationReport};
use eltariff_domain::{SchemaDescriptor, TariffModel, Violation, ViolationCode};
use serde_json::Value;
use tracing::{debug, info};

/// A document that passed every rule
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// The canonical model
    pub model: TariffModel,

    /// What normalization rewrote on the way
    pub notes: Vec<String>,
}

impl Validated {
    /// Take the model, discarding the notes
    pub fn into_model(self) -> TariffModel {
        self.model
    }
}

/// The Gatekeeper validates tariff documents before anything uses them
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// The active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Normalize and validate a raw document
    ///
    /// Structural violations are reported together; semantic rules run only
    /// on a document whose structure is sound, and are also reported
    /// together. The input is never modified.
    pub fn validate(&self, raw: &Value) -> Result<Validated, ValidationReport> {
        let mut violations = Vec::new();

        if !raw.is_object() {
            violations.push(Violation::new(
                "",
                ViolationCode::WrongType,
                "expected a tariff document object",
            ));
            return Err(ValidationReport::new(violations, Vec::new()));
        }

        let descriptor = match raw.get("schemaVersion").and_then(Value::as_str) {
            None => SchemaDescriptor::current(),
            Some(version) => SchemaDescriptor::for_version(version).unwrap_or_else(|| {
                violations.push(Violation::new(
                    "schemaVersion",
                    ViolationCode::UnsupportedSchemaVersion,
                    format!(
                        "schema version {} is not supported (supported: {})",
                        version,
                        SchemaDescriptor::supported_versions().join(", ")
                    ),
                ));
                SchemaDescriptor::current()
            }),
        };

        let mut document = raw.clone();
        let mut notes = Normalizer::new(descriptor, &self.config).normalize(&mut document);
        debug!(notes = notes.len(), version = descriptor.version(), "Normalized document");

        let (structural, extension_notes) = StructureCheck::new(descriptor, &self.config).run(&document);
        violations.extend(structural);
        notes.extend(extension_notes);
        if !violations.is_empty() {
            debug!(violations = violations.len(), "Structural validation failed");
            return Err(ValidationReport::new(violations, notes));
        }

        let model: TariffModel = match serde_json::from_value(document) {
            Ok(model) => model,
            Err(e) => {
                violations.push(Violation::new("", ViolationCode::WrongType, e.to_string()));
                return Err(ValidationReport::new(violations, notes));
            }
        };

        let semantic = SemanticCheck::new(&self.config).run(&model);
        if !semantic.is_empty() {
            debug!(violations = semantic.len(), "Semantic validation failed");
            return Err(ValidationReport::new(semantic, notes));
        }

        info!(
            tariffs = model.tariffs.len(),
            notes = notes.len(),
            "Tariff document validated"
        );
        Ok(Validated { model, notes })
    }

    /// Validate a document given as JSON text
    pub fn validate_json(&self, json: &str) -> Result<Validated, ValidationReport> {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => self.validate(&value),
            Err(e) => Err(ValidationReport::new(
                vec![Violation::new(
                    "",
                    ViolationCode::WrongType,
                    format!("not valid JSON: {}", e),
                )],
                Vec::new(),
            )),
        }
    }

    /// Re-validate an already typed model
    pub fn validate_model(&self, model: &TariffModel) -> Result<Validated, ValidationReport> {
        match model.to_value() {
            Ok(value) => self.validate(&value),
            Err(e) => Err(ValidationReport::new(
                vec![Violation::new("", ViolationCode::WrongType, e.to_string())],
                Vec::new(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Roughly what a model returns for a simple fuse tariff
    fn raw_document() -> Value {
        json!({
            "tariffs": [{
                "name": "Säkringstariff 16A",
                "validPeriod": {"fromIncluding": "2025-01-01"},
                "companyName": "Exempel Nät AB",
                "companyOrgNo": "5560000000",
                "direction": "förbrukning",
                "fixedPrice": {
                    "name": "Abonnemangsavgift",
                    "components": [{
                        "name": "Fast avgift 16A",
                        "price": {"priceIncVat": "4 500", "currency": "kr"},
                        "unit": "kr/år"
                    }]
                },
                "energyPrice": {
                    "name": "Överföringsavgift",
                    "components": [{
                        "name": "Överföring",
                        "type": "rörlig",
                        "price": {"priceExVat": "24,5", "vatRate": 25},
                        "unit": "öre/kWh"
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_raw_model_output_is_normalized_and_accepted() {
        let validated = Gatekeeper::default_config().validate(&raw_document()).unwrap();
        let tariff = &validated.model.tariffs[0];

        assert_eq!(tariff.company_org_no, "556000-0000");
        assert_eq!(tariff.time_zone, "Europe/Stockholm");

        let fixed = &tariff.fixed_price.as_ref().unwrap().components[0];
        assert_eq!(fixed.priced_period.as_deref(), Some("P1Y"));
        assert!(fixed.unit.is_none());
        assert_eq!(fixed.price.price_inc_vat, 4500.0);
        assert_eq!(fixed.price.price_ex_vat, 3600.0);

        let energy = &tariff.energy_price.as_ref().unwrap().components[0];
        assert_eq!(energy.component_type, eltariff_domain::ComponentType::Variable);
        assert!((energy.price.price_ex_vat - 0.245).abs() < 1e-9);
        assert_eq!(energy.price.vat_rate, 0.25);

        assert_eq!(validated.model.calendar_patterns.len(), 3);
        assert!(!validated.notes.is_empty());
    }

    #[test]
    fn test_ids_are_stable_across_runs() {
        let gatekeeper = Gatekeeper::default_config();
        let first = gatekeeper.validate(&raw_document()).unwrap().model;
        let second = gatekeeper.validate(&raw_document()).unwrap().model;
        assert_eq!(first, second);
        assert!(!first.tariffs[0].id.is_empty());
    }

    #[test]
    fn test_validated_model_revalidates_unchanged() {
        let gatekeeper = Gatekeeper::default_config();
        let validated = gatekeeper.validate(&raw_document()).unwrap();
        let again = gatekeeper.validate_model(&validated.model).unwrap();
        assert_eq!(again.model, validated.model);
    }

    #[test]
    fn test_two_missing_fields_reported_together() {
        let mut raw = raw_document();
        let tariff = raw["tariffs"][0].as_object_mut().unwrap();
        tariff.remove("companyName");
        tariff.remove("validPeriod");

        let report = Gatekeeper::default_config().validate(&raw).unwrap_err();
        let paths: Vec<&str> = report.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"tariffs[0].companyName"));
        assert!(paths.contains(&"tariffs[0].validPeriod"));
        assert!(report.violations.iter().all(|v| v.code == ViolationCode::MissingField));
    }

    #[test]
    fn test_vat_consistency_boundary() {
        let gatekeeper = Gatekeeper::default_config();
        let mut raw = raw_document();
        raw["tariffs"][0]["energyPrice"]["components"][0]["price"] =
            json!({"priceExVat": 100, "priceIncVat": 125, "vatRate": 0.25});
        raw["tariffs"][0]["energyPrice"]["components"][0]["unit"] = json!("kWh");
        assert!(gatekeeper.validate(&raw).is_ok());

        raw["tariffs"][0]["energyPrice"]["components"][0]["price"]["priceIncVat"] = json!(140);
        let report = gatekeeper.validate(&raw).unwrap_err();
        assert_eq!(report.codes(), vec![ViolationCode::VatMismatch]);
    }

    #[test]
    fn test_unsupported_schema_version() {
        let mut raw = raw_document();
        raw["schemaVersion"] = json!("9.9.9");
        let report = Gatekeeper::default_config().validate(&raw).unwrap_err();
        assert!(report.has(ViolationCode::UnsupportedSchemaVersion));
    }

    #[test]
    fn test_extensions_preserved() {
        let mut raw = raw_document();
        raw["tariffs"][0]["fuseSize"] = json!("16A");
        let validated = Gatekeeper::default_config().validate(&raw).unwrap();
        assert_eq!(validated.model.tariffs[0].extensions["fuseSize"], json!("16A"));
        assert!(validated.notes.iter().any(|n| n.contains("kept as extension")));

        let strict = Gatekeeper::new(ValidationConfig::strict());
        assert!(strict.validate(&raw).unwrap_err().has(ViolationCode::UnknownField));
    }

    #[test]
    fn test_rejects_non_object_and_bad_json() {
        let gatekeeper = Gatekeeper::default_config();
        assert!(gatekeeper.validate(&json!([1, 2])).unwrap_err().has(ViolationCode::WrongType));
        assert!(gatekeeper.validate_json("{not json").is_err());
    }

    #[test]
    fn test_input_not_modified() {
        let raw = raw_document();
        let before = raw.clone();
        let _ = Gatekeeper::default_config().validate(&raw);
        assert_eq!(raw, before);
    }
}
