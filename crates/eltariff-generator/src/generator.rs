//! Package generation from a validated tariff model

use crate::error::GeneratorError;
use crate::openapi::build_openapi;
use crate::package::GeneratedPackage;
use crate::service::ServiceInfo;
use crate::templates;
use eltariff_domain::{SchemaDescriptor, TariffModel, CURRENT_SCHEMA_VERSION};
use eltariff_gatekeeper::Gatekeeper;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Schema versions with a package template
pub const TEMPLATE_VERSIONS: &[&str] = &[CURRENT_SCHEMA_VERSION];

/// Renders deployable API packages
#[derive(Debug, Clone, Default)]
pub struct PackageGenerator {
    gatekeeper: Gatekeeper,
}

impl PackageGenerator {
    /// Create a generator that re-validates with `gatekeeper`
    pub fn new(gatekeeper: Gatekeeper) -> Self {
        Self { gatekeeper }
    }

    /// Generate the package for `model`
    ///
    /// Output is byte-identical for identical models.
    pub fn generate(&self, model: &TariffModel) -> Result<GeneratedPackage, GeneratorError> {
        let descriptor = template_descriptor(&model.schema_version)?;
        let validated = self
            .gatekeeper
            .validate_model(model)
            .map_err(GeneratorError::InvalidModel)?;
        let model = validated.model;
        let info = ServiceInfo::from_model(&model, descriptor);
        debug!(service = %info.service_name, tariffs = model.tariffs.len(), "Rendering package");

        let mut openapi = serde_json::to_string_pretty(&build_openapi(descriptor, &model, &info)?)?;
        openapi.push('\n');
        let mut tariffs = model.to_json_pretty()?;
        tariffs.push('\n');

        let files = BTreeMap::from([
            ("openapi.json".to_string(), openapi),
            ("tariffs.json".to_string(), tariffs),
            ("Cargo.toml".to_string(), templates::cargo_toml(&info)),
            ("src/main.rs".to_string(), templates::main_rs(&info)),
            ("Dockerfile".to_string(), templates::dockerfile(&info, &model)),
            ("docker-compose.yml".to_string(), templates::docker_compose(&info)),
            ("README.md".to_string(), templates::readme(&info, &model)),
        ]);

        let package = GeneratedPackage::new(descriptor.version(), info.service_name, files);
        info!(
            files = package.files.len(),
            digest = %package.digest,
            "Package generated"
        );
        Ok(package)
    }
}

fn template_descriptor(version: &str) -> Result<&'static SchemaDescriptor, GeneratorError> {
    SchemaDescriptor::for_version(version)
        .filter(|_| TEMPLATE_VERSIONS.contains(&version))
        .ok_or_else(|| GeneratorError::UnsupportedSchemaVersion {
            version: version.to_string(),
            supported: TEMPLATE_VERSIONS.iter().map(|v| v.to_string()).collect(),
        })
}
