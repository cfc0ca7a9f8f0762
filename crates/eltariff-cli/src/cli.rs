//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Eltariff CLI - Extract, validate and publish Swedish grid tariffs.
#[derive(Debug, Parser)]
#[command(name = "eltariff")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ELTARIFF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a tariff model from tariff documents
    Parse(ParseArgs),

    /// Amend an existing tariff model under an instruction
    Improve(ImproveArgs),

    /// Validate a tariff document without calling a model
    Validate(ValidateArgs),

    /// Generate a deployable tariff API package
    Generate(GenerateArgs),
}

/// Arguments for the parse command.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Plain text file
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Text extracted from a PDF
    #[arg(long)]
    pub pdf_text: Option<PathBuf>,

    /// Saved web page text, requires --url
    #[arg(long, requires = "url")]
    pub page: Option<PathBuf>,

    /// Address the page was fetched from
    #[arg(long, requires = "page")]
    pub url: Option<String>,

    /// Tariff JSON already in the grid tariff format
    #[arg(long)]
    pub structured: Option<PathBuf>,

    /// Grid operator name, when the documents do not state it clearly
    #[arg(long)]
    pub company: Option<String>,

    /// Write the model to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the improve command.
#[derive(Debug, Parser)]
pub struct ImproveArgs {
    /// Tariff document to amend
    #[arg(short, long)]
    pub prior: PathBuf,

    /// What to change, in plain language
    #[arg(short, long)]
    pub instruction: String,

    /// Additional evidence as plain text
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Write the model to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Tariff document
    pub file: PathBuf,
}

/// Arguments for the generate command.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Validated tariff document
    pub file: PathBuf,

    /// Directory to write the package into
    #[arg(short, long)]
    pub out: PathBuf,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::parse_from([
            "eltariff",
            "parse",
            "--pdf-text",
            "tariff.txt",
            "--page",
            "page.txt",
            "--url",
            "https://example.se/priser",
        ]);
        match cli.command {
            Command::Parse(args) => {
                assert_eq!(args.pdf_text, Some(PathBuf::from("tariff.txt")));
                assert_eq!(args.url.as_deref(), Some("https://example.se/priser"));
                assert!(args.text.is_none());
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_page_requires_url() {
        let result = Cli::try_parse_from(["eltariff", "parse", "--page", "page.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["eltariff", "validate", "tariffs.json", "--format", "json", "--no-color"]);
        assert!(cli.no_color);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn test_improve_requires_instruction() {
        let result = Cli::try_parse_from(["eltariff", "improve", "--prior", "tariffs.json"]);
        assert!(result.is_err());
    }
}
