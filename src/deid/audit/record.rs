//! Audit record model
//!
//! A record describes one detection or restoration pass over a document
//! without containing any of the document's content: only a truncated hash
//! of the text, the set of PHI types and counts.

use crate::deid::models::PhiType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Hex characters of the SHA-256 digest kept in a record
pub const TEXT_HASH_LEN: usize = 16;

/// Which pass produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Detection,
    Restoration,
}

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub document_id: String,
    pub event: AuditEvent,
    /// First 16 hex chars of SHA-256 over the text the pass saw
    pub text_hash: String,
    pub phi_type_set: BTreeSet<PhiType>,
    pub phi_count: usize,
    pub high_confidence_count: usize,
}

impl AuditRecord {
    /// Build a record from the `(type, confidence)` pairs of a pass
    pub fn new<I>(
        document_id: &str,
        event: AuditEvent,
        text: &str,
        detections: I,
        high_confidence_threshold: f32,
    ) -> Self
    where
        I: IntoIterator<Item = (PhiType, f32)>,
    {
        let mut phi_type_set = BTreeSet::new();
        let mut phi_count = 0;
        let mut high_confidence_count = 0;
        for (phi_type, confidence) in detections {
            phi_type_set.insert(phi_type);
            phi_count += 1;
            if confidence >= high_confidence_threshold {
                high_confidence_count += 1;
            }
        }

        Self {
            timestamp: Utc::now(),
            document_id: document_id.to_string(),
            event,
            text_hash: hash_text(text),
            phi_type_set,
            phi_count,
            high_confidence_count,
        }
    }
}

/// Truncated SHA-256 hex digest of `text`
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..TEXT_HASH_LEN].to_string()
}
