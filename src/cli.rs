//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Development server for single-page apps, with automatic reload.
#[derive(Debug, Parser)]
#[command(name = "spa-devd", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// `prefix=target` mappings, or directories to change into
    #[arg(value_name = "MAPPING|DIR")]
    pub args: Vec<String>,
}

impl Cli {
    /// The effective log level: flag first, then config.
    pub fn log_level(&self, configured: Option<&str>) -> String {
        self.log_level
            .as_deref()
            .or(configured)
            .unwrap_or("info")
            .to_string()
    }
}
