//! Generate command implementation.

use super::load_model;
use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use eltariff_gatekeeper::Gatekeeper;
use eltariff_generator::{GeneratedPackage, PackageGenerator};
use std::fs;
use std::path::Path;
use tracing::info;

/// Checksum listing written next to the package files
pub const CHECKSUM_FILE: &str = "SHA256SUMS";

/// Execute the generate command.
pub async fn execute_generate(args: GenerateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let gatekeeper = Gatekeeper::new(config.validation.clone());
    let model = load_model(&args.file, &gatekeeper)?;
    let package = PackageGenerator::new(gatekeeper).generate(&model)?;

    write_package(&package, &args.out)?;
    println!("{}", formatter.format_package(&package, &args.out)?);
    Ok(())
}

/// Write every file of `package` under `dir`, then the checksum listing.
pub fn write_package(package: &GeneratedPackage, dir: &Path) -> Result<()> {
    for (path, content) in &package.files {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
    }
    fs::write(dir.join(CHECKSUM_FILE), package.checksums())?;
    info!(dir = %dir.display(), files = package.files.len(), "Package written");
    Ok(())
}
