//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use colored::*;
use eltariff_domain::{PriceElement, TariffModel};
use eltariff_extractor::{Alternative, ExtractionMetadata, ExtractorError};
use eltariff_gatekeeper::ValidationReport;
use eltariff_generator::GeneratedPackage;
use serde_json::json;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a tariff model.
    ///
    /// JSON output is the tariff document itself, so it can be piped.
    pub fn format_model(&self, model: &TariffModel) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(model.to_json_pretty()?),
            OutputFormat::Table => Ok(self.format_model_table(model)),
        }
    }

    fn format_model_table(&self, model: &TariffModel) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Tariff", "Element", "Component", "Type", "Ex VAT", "Inc VAT", "Unit", "Period"]);

        for tariff in &model.tariffs {
            let elements = [&tariff.fixed_price, &tariff.energy_price, &tariff.power_price];
            for element in elements.into_iter().flatten() {
                push_components(&mut builder, &tariff.name, element);
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut out = table.to_string();
        if let Some(operator) = model.operator_name() {
            out.push('\n');
            out.push_str(&self.info(&format!(
                "{} ({}), {} tariff(s)",
                operator,
                model.operator_id().unwrap_or("-"),
                model.tariffs.len()
            )));
        }
        for warning in &model.warnings {
            out.push('\n');
            out.push_str(&self.warning(warning));
        }
        out
    }

    /// Format the outcome of a successful extraction.
    pub fn format_extraction_summary(
        &self,
        metadata: &ExtractionMetadata,
        notes: &[String],
        alternatives: &[Alternative],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "backend": metadata.backend,
                "modelAttempts": metadata.model_attempts,
                "backendCalls": metadata.backend_calls,
                "sources": metadata.sources,
                "processingTimeMs": metadata.processing_time_ms,
                "notes": notes,
                "alternatives": alternatives,
            }))?),
            OutputFormat::Table => {
                let sources: Vec<&str> = metadata.sources.iter().map(|s| s.as_str()).collect();
                let mut lines = vec![self.success(&format!(
                    "Extracted with {} in {} ms ({} attempt(s), {} call(s), sources: {})",
                    metadata.backend,
                    metadata.processing_time_ms,
                    metadata.model_attempts,
                    metadata.backend_calls,
                    sources.join(", ")
                ))];
                lines.extend(notes.iter().map(|n| self.info(n)));
                if !alternatives.is_empty() {
                    lines.push(self.format_alternatives_table(alternatives));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    fn format_alternatives_table(&self, alternatives: &[Alternative]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Path", "Kept", "From", "Discarded", "From"]);
        for alt in alternatives {
            builder.push_record([
                alt.path.clone(),
                alt.kept.to_string(),
                alt.kept_source.to_string(),
                alt.discarded.to_string(),
                alt.source.to_string(),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Format a passing validation.
    pub fn format_valid(&self, model: &TariffModel, notes: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "valid": true,
                "tariffs": model.tariff_ids(),
                "notes": notes,
            }))?),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!("Valid: {} tariff(s)", model.tariffs.len()))];
                lines.extend(notes.iter().map(|n| self.info(n)));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a failing validation.
    pub fn format_report(&self, report: &ValidationReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "valid": false,
                "violations": report.violations,
                "notes": report.notes,
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Path", "Rule", "Message"]);
                for violation in &report.violations {
                    builder.push_record([
                        violation.path.as_str(),
                        violation.code.as_str(),
                        violation.message.as_str(),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(format!(
                    "{}\n{}",
                    self.error(&format!("{} violation(s)", report.violations.len())),
                    table
                ))
            }
        }
    }

    /// Format a written package.
    pub fn format_package(&self, package: &GeneratedPackage, dir: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "directory": dir.display().to_string(),
                "serviceName": package.service_name,
                "schemaVersion": package.schema_version,
                "files": package.digests,
                "digest": package.digest,
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["File", "SHA-256"]);
                for (path, digest) in &package.digests {
                    builder.push_record([path.as_str(), &digest[..16]]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(format!(
                    "{}\n{}\n{}",
                    self.success(&format!("Package {} written to {}", package.service_name, dir.display())),
                    table,
                    self.info(&format!("Package digest {}", package.digest))
                ))
            }
        }
    }

    /// Format a failure for stderr.
    pub fn format_error(&self, error: &CliError) -> String {
        let kind = error.kind().map(|k| k.as_str()).unwrap_or("error");
        if matches!(self.format, OutputFormat::Json) {
            let mut body = json!({"error": kind, "message": error.to_string()});
            if let CliError::Extraction(e) = error {
                if let Some(raw) = e.raw_output() {
                    body["rawOutput"] = json!(raw);
                }
                if let ExtractorError::MergeConflictUnresolved { conflicts } = e {
                    body["conflicts"] = json!(conflicts);
                }
                body["retryable"] = json!(e.is_retryable());
            }
            return serde_json::to_string_pretty(&body).unwrap_or_else(|_| error.to_string());
        }

        let mut lines = vec![self.error(&format!("[{}] {}", kind, error))];
        if let CliError::Extraction(ExtractorError::MergeConflictUnresolved { conflicts }) = error {
            for conflict in conflicts {
                let values: Vec<String> = conflict
                    .values
                    .iter()
                    .map(|(source, value)| format!("{}={}", source, value))
                    .collect();
                lines.push(self.warning(&format!("{}: {}", conflict.path, values.join(" vs "))));
            }
        }
        if let CliError::Extraction(e) = error {
            if e.is_retryable() {
                lines.push(self.info("The backend may recover; retry later"));
            }
        }
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn push_components(builder: &mut Builder, tariff: &str, element: &PriceElement) {
    for component in &element.components {
        builder.push_record([
            tariff.to_string(),
            element.name.clone(),
            component.name.clone(),
            component.component_type.as_str().to_string(),
            format!("{:.4} {}", component.price.price_ex_vat, component.price.currency.as_str()),
            format!("{:.4}", component.price.price_inc_vat),
            component.unit.map(|u| u.to_string()).unwrap_or_else(|| "-".to_string()),
            component.priced_period.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
}
