//! Configuration management for phiguard.
//!
//! # Overview
//!
//! phiguard uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PHIGUARD_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (name, log level)
//! - [`DetectionConfig`] - Pattern library, time budgets, confidence thresholds
//! - [`AuditConfig`] - Audit trail location
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! name = "phiguard"
//! log_level = "info"
//!
//! [detection]
//! rule_timeout_ms = 250
//! document_timeout_ms = 10000
//! min_confidence = 0.7
//!
//! [audit]
//! enabled = true
//! log_path = "${PHIGUARD_AUDIT_DIR}/phi_audit.jsonl"
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use phiguard::config::load_config;
//!
//! # fn example() {
//! match load_config("phiguard.toml") {
//!     Ok(config) => println!("Configuration valid"),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use crate::deid::config::{AuditConfig, DetectionConfig};
pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, LoggingConfig, PhiguardConfig};
