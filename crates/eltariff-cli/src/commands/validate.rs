//! Validate command implementation.

use super::read_input;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use eltariff_gatekeeper::Gatekeeper;

/// Execute the validate command.
///
/// The report goes to stdout either way; a failing document also fails the
/// process so scripts can branch on it.
pub async fn execute_validate(args: ValidateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let json = read_input(&args.file)?;
    let gatekeeper = Gatekeeper::new(config.validation.clone());

    match gatekeeper.validate_json(&json) {
        Ok(validated) => {
            println!("{}", formatter.format_valid(&validated.model, &validated.notes)?);
            Ok(())
        }
        Err(report) => {
            println!("{}", formatter.format_report(&report)?);
            Err(CliError::Invalid(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use eltariff_domain::ViolationCode;
    use std::fs;

    #[tokio::test]
    async fn test_validate_reports_violations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tariffs.json");
        fs::write(
            &path,
            r#"{"tariffs": [{
                "name": "Effekttariff",
                "validPeriod": {"fromIncluding": "2025-01-01"},
                "companyName": "Exempel Nät AB",
                "companyOrgNo": "556000-0000",
                "energyPrice": {"name": "Energi", "components": [{
                    "name": "Överföring",
                    "type": "variable",
                    "price": {"priceExVat": 0.24, "priceIncVat": 0.40, "vatRate": 0.25},
                    "unit": "kWh"
                }]}
            }]}"#,
        )
        .unwrap();

        let formatter = Formatter::new(OutputFormat::Json, false);
        let err = execute_validate(ValidateArgs { file: path }, &Config::default(), &formatter)
            .await
            .unwrap_err();
        match err {
            CliError::Invalid(report) => assert!(report.has(ViolationCode::VatMismatch)),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let args = ValidateArgs {
            file: "/nonexistent/tariffs.json".into(),
        };
        let err = execute_validate(args, &Config::default(), &formatter).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }
}
