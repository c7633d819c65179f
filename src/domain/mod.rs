//! Domain models and types for phiguard.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Document input types** ([`Document`], [`DocumentId`])
//! - **Error types** ([`DeidError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible engine operations return [`Result<T, DeidError>`]:
//!
//! ```rust
//! use phiguard::domain::{DeidError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(DeidError::Configuration("pattern library has no rules".to_string()))
//! }
//! ```

pub mod document;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use document::{Document, DocumentId};
pub use errors::DeidError;
pub use result::Result;
