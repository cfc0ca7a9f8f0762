//! Eltariff CLI library.
//!
//! Configuration loading, backend selection, command execution and output
//! formatting for the `eltariff` command-line tool.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
