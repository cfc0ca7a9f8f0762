//! Eltariff CLI - Extract, validate and publish Swedish grid tariffs.

use clap::Parser;
use eltariff_cli::commands;
use eltariff_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    if let Err(e) = run(cli.command, &config, &formatter).await {
        eprintln!("{}", formatter.format_error(&e));
        std::process::exit(e.exit_code());
    }
}

async fn run(command: Command, config: &Config, formatter: &Formatter) -> eltariff_cli::Result<()> {
    match command {
        Command::Parse(args) => commands::execute_parse(args, config, formatter).await,
        Command::Improve(args) => commands::execute_improve(args, config, formatter).await,
        Command::Validate(args) => commands::execute_validate(args, config, formatter).await,
        Command::Generate(args) => commands::execute_generate(args, config, formatter).await,
    }
}
