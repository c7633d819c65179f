//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod restore;
pub mod sanitize;
pub mod scan;
pub mod validate;

use crate::deid::DeidEngine;
use crate::domain::{DocumentId, Result};
use std::path::Path;

/// Close the engine's audit log whether or not the command succeeded
///
/// The command's own error wins over a failure to close.
pub(crate) fn close_after<T>(engine: &DeidEngine, outcome: anyhow::Result<T>) -> anyhow::Result<T> {
    let closed = engine.close();
    if let (Err(e), true) = (&closed, outcome.is_err()) {
        tracing::warn!(error = %e, "Failed to close audit log after command error");
    }
    let value = outcome?;
    closed?;
    Ok(value)
}

/// Document identifier from a flag, or from the input file stem
pub(crate) fn document_id_for(explicit: Option<&str>, input: &Path) -> Result<DocumentId> {
    let raw = match explicit {
        Some(id) => id.to_string(),
        None => match input.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => return Ok(DocumentId::generate()),
        },
    };
    DocumentId::new(raw).map_err(crate::domain::DeidError::Configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deid::audit::MemoryAuditLog;
    use crate::deid::DeidConfig;
    use crate::domain::Document;
    use std::sync::Arc;

    #[test]
    fn test_close_after_closes_on_error() {
        let sink = Arc::new(MemoryAuditLog::new());
        let engine = DeidEngine::new(DeidConfig::without_audit())
            .unwrap()
            .with_audit_sink(sink.clone());

        let outcome: anyhow::Result<i32> = Err(anyhow::anyhow!("map write failed"));
        let err = close_after(&engine, outcome).unwrap_err();
        assert_eq!(err.to_string(), "map write failed");

        let document = Document::new(DocumentId::new("nota").unwrap(), "NSS: 12345678901");
        assert!(engine.sanitize(&document).is_err());
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_close_after_passes_value_through() {
        let engine = DeidEngine::new(DeidConfig::without_audit()).unwrap();
        assert_eq!(close_after(&engine, Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_document_id_from_file_stem() {
        let id = document_id_for(None, Path::new("/tmp/notes/consulta-17.txt")).unwrap();
        assert_eq!(id.as_str(), "consulta-17");
    }

    #[test]
    fn test_document_id_explicit_wins() {
        let id = document_id_for(Some("enc-9"), Path::new("note.txt")).unwrap();
        assert_eq!(id.as_str(), "enc-9");
    }
}
