// Phiguard - Reversible PHI de-identification for clinical text
// Copyright (c) 2025 Phiguard Contributors
// Licensed under the MIT License

//! # Phiguard - reversible PHI de-identification
//!
//! Phiguard finds protected health information (PHI) in Spanish and Mexican
//! clinical notes, replaces each value with a typed placeholder such as
//! `[CURP_0]`, and restores the original values after the sanitized text has
//! been through an external service (typically machine translation).
//!
//! ## Overview
//!
//! - **Detecting** PHI with an ordered, data-driven pattern library covering
//!   the HIPAA Safe Harbor identifiers plus CURP, RFC, NSS and INE
//! - **Resolving** overlapping candidates by confidence, start offset and
//!   rule registration order
//! - **Sanitizing** text with stable `[TYPE_N]` placeholders and a map of
//!   the replaced values
//! - **Restoring** values into translated text and verifying the round trip
//! - **Auditing** every pass with hashed, content-free JSON records
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`deid`] - Detection, placeholder substitution, restoration and audit
//! - [`domain`] - Documents, identifiers and the error type
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phiguard::deid::{DeidConfig, DeidEngine};
//! use phiguard::domain::{Document, DocumentId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DeidEngine::new(DeidConfig::without_audit())?;
//! let document = Document::new(
//!     DocumentId::new("nota-1")?,
//!     "CURP: GOHM450315MGTRNR08 NSS: 12345678901",
//! );
//!
//! let result = engine.sanitize(&document)?;
//! assert_eq!(result.sanitized_text, "CURP: [CURP_0] NSS: [NSS_1]");
//!
//! let restored = engine.restore(&document.id, &result.sanitized_text, &result.map)?;
//! assert_eq!(restored, document.text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Engine operations return [`domain::DeidError`]. Rule timeouts and rule
//! failures never abort a document; they are reported in
//! [`deid::Detection::skipped_rules`].
//!
//! ## Logging
//!
//! Logging uses `tracing`. Events carry document identifiers, rule names and
//! counts, never raw PHI.

pub mod cli;
pub mod config;
pub mod deid;
pub mod domain;
pub mod logging;
