//! Sanitize command implementation
//!
//! Reads one clinical document, replaces detected PHI with placeholders and
//! writes the sanitized text plus the placeholder map needed to restore it.

use super::{close_after, document_id_for};
use crate::cli::resolve_config;
use crate::deid::DeidEngine;
use crate::domain::Document;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the sanitize command
#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// Document to sanitize
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the sanitized text (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Where to write the placeholder map (JSON, contains raw PHI)
    #[arg(short, long)]
    pub map: PathBuf,

    /// Document identifier recorded in the audit trail (defaults to the file stem)
    #[arg(long)]
    pub document_id: Option<String>,
}

impl SanitizeArgs {
    /// Execute the sanitize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = resolve_config(config_path)?;
        let engine = DeidEngine::new(config.deid_config())?;
        let outcome = self.run(&engine);
        close_after(&engine, outcome)
    }

    fn run(&self, engine: &DeidEngine) -> anyhow::Result<i32> {
        let text = fs::read_to_string(&self.input)?;
        let document = Document::new(document_id_for(self.document_id.as_deref(), &self.input)?, text);

        tracing::info!(document_id = %document.id, "Sanitizing document");
        let result = engine.sanitize(&document)?;

        let residual = engine.residual_phi(&result.sanitized_text);
        if !residual.is_empty() {
            tracing::warn!(
                document_id = %document.id,
                residual = residual.len(),
                "Sanitized text still matches PHI rules"
            );
        }

        fs::write(&self.map, result.map.to_json()?)?;
        match self.output {
            Some(ref path) => fs::write(path, &result.sanitized_text)?,
            None => println!("{}", result.sanitized_text),
        }

        eprintln!(
            "✅ {} PHI value(s) replaced; map written to {}",
            result.phi_count(),
            self.map.display()
        );
        Ok(0)
    }
}
