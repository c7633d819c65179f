//! Domain error types
//!
//! This module defines the error taxonomy for the de-identification engine.
//! Errors never carry raw PHI values: spans are reported by offset, rules by name.

use thiserror::Error;

/// Main de-identification error type
///
/// Severity depends on the variant:
/// - [`DeidError::Configuration`] is fatal and surfaces before any matching runs
/// - [`DeidError::RuleTimeout`] and [`DeidError::RuleFailed`] are recovered locally
///   by the matcher (the rule contributes no matches for that document)
/// - [`DeidError::RestorationMismatch`] is reported to the caller and never auto-corrected
/// - [`DeidError::AuditWrite`] is raised after one retry, since audit loss is a compliance issue
#[derive(Debug, Error)]
pub enum DeidError {
    /// Malformed pattern registry or engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single rule exceeded its time budget for one document
    #[error("Rule '{rule}' exceeded its time budget of {budget_ms}ms")]
    RuleTimeout { rule: String, budget_ms: u64 },

    /// A rule's matcher failed at runtime (e.g. backtrack limit exceeded)
    #[error("Rule '{rule}' failed: {message}")]
    RuleFailed { rule: String, message: String },

    /// Restored text differs from the original text
    #[error("Restored text does not match the original (first difference at byte {offset})")]
    RestorationMismatch { offset: usize },

    /// Append to the audit trail failed
    #[error("Audit write error: {0}")]
    AuditWrite(String),

    /// A span handed to the sanitizer does not describe the text
    #[error("Invalid span [{start}, {end}) for text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// A document did not finish within its processing budget
    #[error("Document '{document_id}' exceeded its time budget of {budget_ms}ms")]
    DocumentTimeout { document_id: String, budget_ms: u64 },

    /// The translation collaborator failed
    #[error("Translation error: {0}")]
    Translation(String),

    /// A background worker died before producing a result
    #[error("Worker error: {0}")]
    Worker(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DeidError {
    /// Whether the matcher recovers from this error by dropping the rule
    pub fn is_rule_local(&self) -> bool {
        matches!(self, Self::RuleTimeout { .. } | Self::RuleFailed { .. })
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DeidError {
    fn from(err: std::io::Error) -> Self {
        DeidError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DeidError {
    fn from(err: serde_json::Error) -> Self {
        DeidError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DeidError {
    fn from(err: toml::de::Error) -> Self {
        DeidError::Configuration(format!("TOML parse error: {err}"))
    }
}
