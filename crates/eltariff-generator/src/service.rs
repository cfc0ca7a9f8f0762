//! Facts about the generated service derived from the model

use chrono::SecondsFormat;
use eltariff_domain::{SchemaDescriptor, TariffModel};
use serde_json::{json, Value};

/// Version of the generated server code
pub const IMPLEMENTATION_VERSION: &str = "0.1.0";

/// Fallback service name when the operator name has no usable characters
const DEFAULT_SERVICE_NAME: &str = "eltariff-api";

/// What `/info` reports and the templates are parameterized with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// API display name
    pub name: String,
    /// Schema version served
    pub api_version: String,
    /// Version of the generated code
    pub implementation_version: String,
    /// Newest `lastUpdated` among the tariffs, RFC 3339
    pub last_updated: Option<String>,
    /// Operator display name
    pub operator: String,
    /// Operator organisation number
    pub operator_id: String,
    /// Time zone of the windows
    pub time_zone: String,
    /// Container and crate name
    pub service_name: String,
}

impl ServiceInfo {
    /// Derive service facts from a validated model
    pub fn from_model(model: &TariffModel, descriptor: &SchemaDescriptor) -> Self {
        let operator = model.operator_name().unwrap_or("Grid operator").to_string();
        let last_updated = model
            .tariffs
            .iter()
            .filter_map(|t| t.last_updated)
            .max()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true));
        let time_zone = model
            .tariffs
            .first()
            .map(|t| t.time_zone.clone())
            .unwrap_or_else(|| "Europe/Stockholm".to_string());

        Self {
            name: format!("{} grid tariffs", operator),
            api_version: descriptor.version().to_string(),
            implementation_version: IMPLEMENTATION_VERSION.to_string(),
            last_updated,
            service_name: service_name(&operator),
            operator_id: model.operator_id().unwrap_or_default().to_string(),
            operator,
            time_zone,
        }
    }

    /// Body of `GET /info`
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "apiVersion": self.api_version,
            "implementationVersion": self.implementation_version,
            "lastUpdated": self.last_updated,
            "operator": self.operator,
            "operatorId": self.operator_id,
            "timeZone": self.time_zone,
        })
    }
}

/// Lowercase ASCII slug of an operator name, e.g. `Ellevio AB` → `ellevio-ab`
pub fn service_name(operator: &str) -> String {
    let mut slug = String::with_capacity(operator.len());
    for c in operator.to_lowercase().chars() {
        let mapped = match c {
            'å' | 'ä' | 'á' | 'à' => 'a',
            'ö' | 'ø' | 'ó' => 'o',
            'é' | 'è' | 'ë' => 'e',
            'ü' => 'u',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        };
        if mapped == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(mapped);
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        DEFAULT_SERVICE_NAME.to_string()
    } else {
        slug.to_string()
    }
}
