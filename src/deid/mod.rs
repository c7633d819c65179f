//! PHI detection and reversible de-identification
//!
//! Clinical text is scanned by a data-driven pattern registry, overlapping
//! candidates are resolved by confidence, and every selected span is replaced
//! by a `[TYPE_N]` placeholder. The placeholder map restores the original
//! values after the sanitized text has been through an external transform
//! such as machine translation.
//!
//! # Architecture
//!
//! - **Detector**: [`detector::PatternRegistry`], [`detector::SpanMatcher`]
//!   and [`detector::resolve`]
//! - **Placeholders**: [`placeholder::sanitize`] and [`placeholder::restore`]
//! - **Verification**: [`verify`] round-trip and integrity checks
//! - **Audit**: [`audit::AuditSink`] with hashed, content-free records
//!
//! # Usage
//!
//! ```rust,ignore
//! use phiguard::deid::{DeidConfig, DeidEngine};
//!
//! let engine = DeidEngine::new(DeidConfig::default())?;
//! let result = engine.sanitize(&document)?;
//! let translated = translate(&result.sanitized_text).await?;
//! let restored = engine.restore(&document.id, &translated, &result.map)?;
//! ```

pub mod audit;
pub mod config;
pub mod detector;
pub mod engine;
pub mod models;
pub mod placeholder;
pub mod report;
pub mod translate;
pub mod verify;

// Re-export main types
pub use config::DeidConfig;
pub use engine::{DeidEngine, Detection, DocumentState, ProtectedTranslation, RoundTrip};
pub use models::{PhiMatch, PhiType};
pub use placeholder::{PhiMap, SanitizationResult};
pub use report::DetectionReport;
pub use translate::{PassthroughTranslator, Translator};
