//! Improve command implementation.

use super::{emit_extraction, load_model, read_input, with_stderr_progress};
use crate::backend::build_backend;
use crate::cli::ImproveArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use eltariff_domain::SourceInput;
use eltariff_extractor::Extractor;
use eltariff_gatekeeper::Gatekeeper;

/// Execute the improve command.
pub async fn execute_improve(args: ImproveArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let gatekeeper = Gatekeeper::new(config.validation.clone());
    let prior = load_model(&args.prior, &gatekeeper)?;
    let evidence = match &args.text {
        Some(path) => vec![SourceInput::text(read_input(path)?).with_origin(path.display().to_string())],
        None => Vec::new(),
    };

    let extractor = Extractor::from_arc(build_backend(config)?, gatekeeper, config.extractor.clone());
    let (extractor, echo) = with_stderr_progress(extractor, formatter);
    let extraction = extractor.improve(prior, args.instruction, evidence).await;
    drop(extractor);
    echo.finish().await;
    let extraction = extraction?;

    emit_extraction(&extraction, args.out.as_deref(), formatter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eltariff_domain::ErrorKind;
    use std::fs;

    #[test]
    fn test_load_prior_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tariffs.json");
        fs::write(
            &path,
            r#"{"tariffs": [{
                "name": "Säkringstariff 16A",
                "validPeriod": {"fromIncluding": "2025-01-01"},
                "companyName": "Exempel Nät AB",
                "companyOrgNo": "556000-0000",
                "fixedPrice": {"name": "Fast avgift", "components": [{
                    "name": "Abonnemang",
                    "price": {"priceExVat": 3600},
                    "pricedPeriod": "P1Y"
                }]}
            }]}"#,
        )
        .unwrap();

        let prior = load_model(&path, &Gatekeeper::default_config()).unwrap();
        assert_eq!(prior.tariffs[0].billing_period, "P1M");
        assert!(!prior.tariffs[0].id.is_empty());
    }

    #[test]
    fn test_broken_prior_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tariffs.json");
        fs::write(&path, r#"{"tariffs": [{"name": "Utan bolag"}]}"#).unwrap();

        let err = load_model(&path, &Gatekeeper::default_config()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SchemaValidationFailed));
    }
}
