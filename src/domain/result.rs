//! Result type alias for the de-identification engine
//!
//! This module provides a convenient Result type alias that uses DeidError
//! as the error type.

use super::errors::DeidError;

/// Result type alias for engine operations
///
/// # Examples
///
/// ```
/// use phiguard::domain::result::Result;
/// use phiguard::domain::errors::DeidError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DeidError::Configuration("empty pattern".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DeidError>;
