//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for phiguard using clap.

pub mod commands;

use crate::config::{load_config, PhiguardConfig};
use crate::deid::DocumentState;
use crate::domain::DeidError;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "phiguard.toml";

/// Phiguard - reversible PHI de-identification for clinical text
#[derive(Parser, Debug)]
#[command(name = "phiguard")]
#[command(version, about, long_about = None)]
#[command(author = "Phiguard Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "PHIGUARD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PHIGUARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace PHI in a document with placeholders and write the placeholder map
    Sanitize(commands::sanitize::SanitizeArgs),

    /// Restore original values into a (translated) sanitized document
    Restore(commands::restore::RestoreArgs),

    /// Report detected PHI without modifying documents
    Scan(commands::scan::ScanArgs),

    /// Validate configuration file and pattern library
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Resolve the configuration for a command
///
/// A missing file at the default location falls back to built-in defaults
/// (with environment overrides applied). An explicitly named file must exist.
pub fn resolve_config(config_path: &str) -> crate::domain::Result<PhiguardConfig> {
    if config_path == DEFAULT_CONFIG_PATH && !Path::new(config_path).exists() {
        tracing::debug!("No configuration file found, using defaults");
        return crate::config::parse_config("");
    }
    load_config(config_path)
}

/// Process exit code for a failed command
///
/// - `2` configuration error
/// - `3` restoration mismatch or placeholder loss
/// - `5` any other fatal error
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<DeidError>().map(DocumentState::from_error) {
        Some(DocumentState::ConfigError) => 2,
        Some(DocumentState::Mismatch) => 3,
        _ => 5,
    }
}
