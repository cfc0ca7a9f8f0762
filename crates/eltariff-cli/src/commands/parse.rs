//! Parse command implementation.

use super::{emit_extraction, read_input, with_stderr_progress};
use crate::backend::build_backend;
use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use eltariff_domain::SourceInput;
use eltariff_extractor::{Extraction, ExtractionRequest, Extractor};
use eltariff_gatekeeper::Gatekeeper;

/// Execute the parse command.
pub async fn execute_parse(args: ParseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let sources = collect_sources(&args)?;
    let extractor = Extractor::from_arc(
        build_backend(config)?,
        Gatekeeper::new(config.validation.clone()),
        config.extractor.clone(),
    );
    let (extractor, echo) = with_stderr_progress(extractor, formatter);

    let extraction = run_parse(&extractor, sources, args.company.as_deref()).await;
    drop(extractor);
    echo.finish().await;
    let extraction = extraction?;
    emit_extraction(&extraction, args.out.as_deref(), formatter)
}

/// Extract from the collected sources.
pub async fn run_parse(extractor: &Extractor, sources: Vec<SourceInput>, company: Option<&str>) -> Result<Extraction> {
    let mut request = ExtractionRequest::new(sources);
    if let Some(company) = company {
        request = request.with_company_hint(company);
    }
    Ok(extractor.extract(request).await?)
}

/// Read every source file named on the command line.
pub fn collect_sources(args: &ParseArgs) -> Result<Vec<SourceInput>> {
    let mut sources = Vec::new();

    if let Some(path) = &args.text {
        sources.push(SourceInput::text(read_input(path)?).with_origin(path.display().to_string()));
    }

    if let Some(path) = &args.pdf_text {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push(SourceInput::pdf(read_input(path)?, filename));
    }

    match (&args.page, &args.url) {
        (Some(path), Some(url)) => sources.push(SourceInput::url(read_input(path)?, url.as_str())),
        (None, None) => {}
        _ => {
            return Err(CliError::InvalidInput(
                "--page and --url must be given together".to_string(),
            ))
        }
    }

    if let Some(path) = &args.structured {
        sources.push(SourceInput::structured(read_input(path)?).with_origin(path.display().to_string()));
    }

    if sources.is_empty() {
        return Err(CliError::InvalidInput(
            "Give at least one of --text, --pdf-text, --page or --structured".to_string(),
        ));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eltariff_domain::{ErrorKind, SourceKind};
    use eltariff_extractor::ExtractorConfig;
    use eltariff_llm::MockBackend;
    use std::fs;

    const MODEL_OUTPUT: &str = r#"{
        "tariffs": [{
            "name": "Säkringstariff 16A",
            "validPeriod": {"fromIncluding": "2025-01-01"},
            "companyName": "Exempel Nät AB",
            "companyOrgNo": "556000-0000",
            "fixedPrice": {
                "name": "Fast avgift",
                "components": [{
                    "name": "Abonnemang",
                    "price": {"priceExVat": 3600, "vatRate": 0.25},
                    "pricedPeriod": "P1Y"
                }]
            }
        }]
    }"#;

    fn args() -> ParseArgs {
        ParseArgs {
            text: None,
            pdf_text: None,
            page: None,
            url: None,
            structured: None,
            company: None,
            out: None,
        }
    }

    #[test]
    fn test_collect_sources_in_flag_order() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("tariff-2025.txt");
        let page = dir.path().join("page.txt");
        fs::write(&pdf, "Nätavgift 2025, fast avgift 300 kr/mån").unwrap();
        fs::write(&page, "Elnätsavgift för säkring 16A").unwrap();

        let sources = collect_sources(&ParseArgs {
            pdf_text: Some(pdf),
            page: Some(page),
            url: Some("https://example.se/priser".to_string()),
            ..args()
        })
        .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, SourceKind::Pdf);
        assert_eq!(sources[0].origin.as_deref(), Some("tariff-2025.txt"));
        assert_eq!(sources[1].kind, SourceKind::Url);
        assert_eq!(sources[1].origin.as_deref(), Some("https://example.se/priser"));
    }

    #[test]
    fn test_no_sources_is_invalid_input() {
        let err = collect_sources(&args()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidRequest));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = collect_sources(&ParseArgs {
            text: Some("/nonexistent/tariff.txt".into()),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tariff.txt"));
    }

    #[tokio::test]
    async fn test_parse_with_mock_backend() {
        let backend = MockBackend::new(MODEL_OUTPUT);
        let extractor = Extractor::new(backend.clone(), Gatekeeper::default_config(), ExtractorConfig::default());
        let sources = vec![SourceInput::text("Elnätsavgift 2025: abonnemang 3600 kr per år, säkring 16A")];

        let extraction = run_parse(&extractor, sources, Some("Exempel Nät AB")).await.unwrap();
        assert_eq!(extraction.model.tariffs.len(), 1);
        assert_eq!(backend.call_count(), 1);
        let request = backend.last_request().unwrap();
        assert!(request.messages[0].content.contains("Grid operator: Exempel Nät AB"));
    }
}
