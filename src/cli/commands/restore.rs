//! Restore command implementation
//!
//! Puts original values back into a sanitized (and possibly translated)
//! document using the placeholder map written by `sanitize`.

use super::{close_after, document_id_for};
use crate::cli::resolve_config;
use crate::deid::verify::{check_placeholder_integrity, verify_round_trip};
use crate::deid::{DeidEngine, PhiMap};
use crate::domain::DeidError;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Sanitized or translated document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Placeholder map produced by `sanitize`
    #[arg(short, long)]
    pub map: PathBuf,

    /// Where to write the restored text (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Original document to verify the restored text against
    #[arg(long)]
    pub original: Option<PathBuf>,

    /// Document identifier recorded in the audit trail (defaults to the file stem)
    #[arg(long)]
    pub document_id: Option<String>,
}

impl RestoreArgs {
    /// Execute the restore command
    ///
    /// Returns exit code 3 when placeholders were lost or the restored text
    /// differs from `--original`.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = resolve_config(config_path)?;
        let engine = DeidEngine::new(config.deid_config())?;
        let outcome = self.run(&engine);
        close_after(&engine, outcome)
    }

    fn run(&self, engine: &DeidEngine) -> anyhow::Result<i32> {
        let text = fs::read_to_string(&self.input)?;
        let map = PhiMap::from_json(&fs::read_to_string(&self.map)?)?;
        let document_id = document_id_for(self.document_id.as_deref(), &self.input)?;

        let integrity = check_placeholder_integrity(&text, &map);
        let restored = engine.restore(&document_id, &text, &map)?;

        match self.output {
            Some(ref path) => fs::write(path, &restored)?,
            None => println!("{restored}"),
        }

        let mut exit_code = 0;
        if !integrity.is_intact() {
            eprintln!(
                "⚠️  {} of {} placeholder(s) missing, {} unexpected",
                integrity.missing.len(),
                integrity.expected,
                integrity.unexpected.len()
            );
            exit_code = 3;
        }

        if let Some(ref original_path) = self.original {
            let original = fs::read_to_string(original_path)?;
            match verify_round_trip(&original, &restored) {
                Ok(()) => eprintln!("✅ Restored text matches the original"),
                Err(DeidError::RestorationMismatch { offset }) => {
                    eprintln!("❌ Restored text differs from the original at byte {offset}");
                    exit_code = 3;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
        let engine = DeidEngine::new(crate::deid::DeidConfig::without_audit()).unwrap();
        let document = crate::domain::Document::new(
            crate::domain::DocumentId::new("nota").unwrap(),
            "CURP: GOHM450315MGTRNR08 NSS: 12345678901",
        );
        let result = engine.sanitize(&document).unwrap();

        let sanitized = dir.path().join("nota.txt");
        let map = dir.path().join("nota.map.json");
        let original = dir.path().join("original.txt");
        fs::write(&sanitized, &result.sanitized_text).unwrap();
        fs::write(&map, result.map.to_json().unwrap()).unwrap();
        fs::write(&original, &document.text).unwrap();
        (sanitized, map, original)
    }

    fn config_file(dir: &TempDir) -> String {
        let path = dir.path().join("phiguard.toml");
        fs::write(&path, "[audit]\nenabled = false\n").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_restore_matches_original() {
        let dir = TempDir::new().unwrap();
        let (input, map, original) = write_fixture(&dir);
        let output = dir.path().join("restored.txt");

        let args = RestoreArgs {
            input,
            map,
            output: Some(output.clone()),
            original: Some(original.clone()),
            document_id: None,
        };
        assert_eq!(args.execute(&config_file(&dir)).await.unwrap(), 0);
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            fs::read_to_string(original).unwrap()
        );
    }

    #[tokio::test]
    async fn test_restore_reports_lost_placeholder() {
        let dir = TempDir::new().unwrap();
        let (input, map, original) = write_fixture(&dir);
        fs::write(&input, "CURP: [CURP_0] NSS:").unwrap();

        let args = RestoreArgs {
            input,
            map,
            output: Some(dir.path().join("restored.txt")),
            original: Some(original),
            document_id: None,
        };
        assert_eq!(args.execute(&config_file(&dir)).await.unwrap(), 3);
    }
}
