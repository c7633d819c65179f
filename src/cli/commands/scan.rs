//! Scan command implementation
//!
//! Runs detection over documents and prints a report. Nothing is
//! substituted and no placeholder map is written.

use super::document_id_for;
use crate::cli::resolve_config;
use crate::deid::DeidEngine;
use crate::domain::Document;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Documents to scan (repeatable)
    #[arg(short, long, required = true)]
    pub input: Vec<PathBuf>,

    /// Print the report as JSON instead of a console summary
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = resolve_config(config_path)?;
        let mut deid_config = config.deid_config();
        deid_config.audit.enabled = false;
        let engine = DeidEngine::new(deid_config)?;

        let mut documents = Vec::with_capacity(self.input.len());
        for path in &self.input {
            let text = fs::read_to_string(path)?;
            documents.push(Document::new(document_id_for(None, path)?, text));
        }

        tracing::info!(documents = documents.len(), "Scanning documents");
        let report = engine.report(&documents);

        if self.json {
            println!("{}", report.format_json()?);
        } else {
            println!("{}", report.format_console());
        }

        if let Some(ref path) = self.report {
            report.write_to_file(path)?;
            eprintln!("📄 Report written to {}", path.display());
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_scan_writes_report_without_raw_values() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("nota.txt");
        let report = dir.path().join("report.json");
        fs::write(&input, "CURP: GOHM450315MGTRNR08 NSS: 12345678901").unwrap();

        let args = ScanArgs {
            input: vec![input],
            json: true,
            report: Some(report.clone()),
        };
        let code = args.execute("phiguard.toml").await.unwrap();

        assert_eq!(code, 0);
        let json = fs::read_to_string(report).unwrap();
        assert!(json.contains("\"total_phi_detected\": 2"));
        assert!(!json.contains("GOHM450315MGTRNR08"));
        assert!(!json.contains("12345678901"));
    }
}
