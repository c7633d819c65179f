//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted log files with rotation
//! - Configurable log levels
//! - Console output for interactive use
//!
//! Log events never carry raw PHI. Documents are referenced by identifier
//! and counts only.
//!
//! # Example
//!
//! ```no_run
//! use phiguard::logging::init_logging;
//! use phiguard::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a pattern rule that was skipped for one document
///
/// # Example
///
/// ```no_run
/// use phiguard::log_rule_skipped;
/// use phiguard::domain::DeidError;
///
/// let error = DeidError::RuleTimeout { rule: "curp".to_string(), budget_ms: 250 };
/// log_rule_skipped!("curp", &error);
/// ```
#[macro_export]
macro_rules! log_rule_skipped {
    ($rule:expr, $error:expr) => {
        tracing::warn!(
            rule = %$rule,
            error = %$error,
            "Pattern rule skipped"
        );
    };
}

/// Log a sanitized document
///
/// # Example
///
/// ```no_run
/// use phiguard::log_document_processed;
/// use phiguard::domain::DocumentId;
/// use std::time::Duration;
///
/// let id = DocumentId::new("note-1").unwrap();
/// log_document_processed!(&id, 3, 0, Duration::from_millis(12));
/// ```
#[macro_export]
macro_rules! log_document_processed {
    ($document_id:expr, $phi_count:expr, $skipped_rules:expr, $duration:expr) => {
        tracing::info!(
            document_id = %$document_id,
            phi_count = $phi_count,
            skipped_rules = $skipped_rules,
            duration_ms = $duration.as_millis() as u64,
            "Document sanitized"
        );
    };
}

/// Log a batch processing operation
///
/// # Example
///
/// ```no_run
/// use phiguard::log_batch_processing;
///
/// log_batch_processing!(98, 100);
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($succeeded:expr, $total:expr) => {
        tracing::info!(
            succeeded = $succeeded,
            total = $total,
            success_pct = if $total == 0 {
                100.0
            } else {
                $succeeded as f64 / $total as f64 * 100.0
            },
            "Batch processed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use phiguard::log_retry_attempt;
///
/// log_retry_attempt!(1, 1, "disk full");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
