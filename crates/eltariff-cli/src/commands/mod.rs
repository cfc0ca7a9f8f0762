//! Command implementations.

pub mod generate;
pub mod improve;
pub mod parse;
pub mod validate;

pub use self::generate::execute_generate;
pub use self::improve::execute_improve;
pub use self::parse::execute_parse;
pub use self::validate::execute_validate;

use crate::error::{CliError, Result};
use crate::output::Formatter;
use eltariff_domain::TariffModel;
use eltariff_extractor::{ChannelProgress, Extraction, Extractor};
use eltariff_gatekeeper::Gatekeeper;
use std::fs;
use std::path::Path;
use tokio::task::JoinHandle;

/// Read a whole input file, naming it on failure.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::InvalidInput(format!("Cannot read {}: {}", path.display(), e)))
}

/// Read a tariff document and pass it through the gatekeeper.
///
/// A hand-edited file with missing defaults is accepted while a broken one
/// is refused before any model call or generation.
pub(crate) fn load_model(path: &Path, gatekeeper: &Gatekeeper) -> Result<TariffModel> {
    let json = read_input(path)?;
    gatekeeper
        .validate_json(&json)
        .map(|validated| validated.into_model())
        .map_err(CliError::Invalid)
}

/// Stage echo running beside an extraction
pub(crate) struct ProgressEcho {
    task: JoinHandle<Vec<&'static str>>,
}

impl ProgressEcho {
    /// Wait until every stage has been echoed and return them in order.
    ///
    /// The extractor owning the sink must be dropped first, or this never
    /// returns.
    pub(crate) async fn finish(self) -> Vec<&'static str> {
        self.task.await.unwrap_or_default()
    }
}

/// Attach a progress sink that reports stages on stderr.
pub(crate) fn with_stderr_progress(extractor: Extractor, formatter: &Formatter) -> (Extractor, ProgressEcho) {
    let (sink, mut events) = ChannelProgress::new();
    let echo = matches!(formatter.format(), crate::config::OutputFormat::Table);
    let task = tokio::spawn(async move {
        let mut stages = Vec::new();
        while let Some(event) = events.recv().await {
            if echo {
                eprintln!("  {}", event.stage());
            }
            stages.push(event.stage());
        }
        stages
    });
    (extractor.with_progress(sink), ProgressEcho { task })
}

/// Write the model of an extraction to `out` or stdout, then the summary to stderr.
pub(crate) fn emit_extraction(extraction: &Extraction, out: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match out {
        Some(path) => {
            let mut json = extraction.model.to_json_pretty()?;
            json.push('\n');
            fs::write(path, json)?;
            eprintln!("{}", formatter.success(&format!("Model written to {}", path.display())));
        }
        None => println!("{}", formatter.format_model(&extraction.model)?),
    }
    eprintln!(
        "{}",
        formatter.format_extraction_summary(&extraction.metadata, &extraction.notes, &extraction.alternatives)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use eltariff_domain::SourceInput;
    use eltariff_extractor::{ExtractionRequest, ExtractorConfig};
    use eltariff_llm::MockBackend;

    const MODEL_OUTPUT: &str = r#"{"tariffs": [{
        "name": "Säkringstariff 16A",
        "validPeriod": {"fromIncluding": "2025-01-01"},
        "companyName": "Exempel Nät AB",
        "companyOrgNo": "556000-0000",
        "fixedPrice": {"name": "Fast avgift", "components": [{
            "name": "Abonnemang",
            "price": {"priceExVat": 3600, "vatRate": 0.25},
            "pricedPeriod": "P1Y"
        }]}
    }]}"#;

    #[tokio::test]
    async fn test_every_stage_is_echoed_before_finish_returns() {
        let extractor = Extractor::new(
            MockBackend::new(MODEL_OUTPUT),
            Gatekeeper::default_config(),
            ExtractorConfig::default(),
        );
        let formatter = Formatter::new(OutputFormat::Table, false);
        let (extractor, echo) = with_stderr_progress(extractor, &formatter);

        let request = ExtractionRequest::new(vec![SourceInput::text("Elnätsavgift 2025: abonnemang 3600 kr per år, säkring 16A")]);
        extractor.extract(request).await.unwrap();
        drop(extractor);

        let stages = echo.finish().await;
        assert_eq!(stages.first(), Some(&"normalizing"));
        assert_eq!(stages.last(), Some(&"done"));
    }
}
