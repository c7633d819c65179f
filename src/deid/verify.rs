//! Round-trip and placeholder integrity checks
//!
//! Neither check reports text content: a mismatch is located by byte offset
//! and integrity problems are described by placeholder tokens only.

use crate::deid::placeholder::{placeholder_tokens, PhiMap};
use crate::domain::{DeidError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Fail with [`DeidError::RestorationMismatch`] unless the texts are identical
pub fn verify_round_trip(original: &str, restored: &str) -> Result<()> {
    if original == restored {
        return Ok(());
    }
    let offset = original
        .bytes()
        .zip(restored.bytes())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| original.len().min(restored.len()));
    Err(DeidError::RestorationMismatch { offset })
}

/// What happened to the placeholders of a map in a transformed text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaceholderIntegrity {
    /// Number of placeholders in the map
    pub expected: usize,
    /// Map placeholders absent from the text
    pub missing: Vec<String>,
    /// Placeholder-shaped tokens in the text that the map does not know
    pub unexpected: Vec<String>,
}

impl PlaceholderIntegrity {
    /// Every placeholder survived and nothing foreign appeared
    pub fn is_intact(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Compare the placeholders in `text` with those of `map`
pub fn check_placeholder_integrity(text: &str, map: &PhiMap) -> PlaceholderIntegrity {
    let present: BTreeSet<&str> = placeholder_tokens(text).into_iter().collect();

    let missing = map
        .placeholders()
        .filter(|p| !present.contains(p))
        .map(str::to_string)
        .collect();
    let unexpected = present
        .iter()
        .filter(|token| !map.contains(token))
        .map(|token| token.to_string())
        .collect();

    PlaceholderIntegrity {
        expected: map.len(),
        missing,
        unexpected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deid::detector::resolve;
    use crate::deid::models::{PhiMatch, PhiType};
    use crate::deid::placeholder::sanitize;
    use crate::domain::DocumentId;

    fn sample_map() -> PhiMap {
        let text = "CURP: GOHM450315MGTRNR08 NSS: 12345678901";
        let matches = resolve(vec![
            PhiMatch::new(PhiType::Curp, "GOHM450315MGTRNR08", 6, 24, 1.0),
            PhiMatch::new(PhiType::Nss, "12345678901", 30, 41, 0.95),
        ]);
        sanitize(&DocumentId::new("d").unwrap(), text, &matches)
            .unwrap()
            .map
    }

    #[test]
    fn test_identical_texts_verify() {
        assert!(verify_round_trip("igual", "igual").is_ok());
    }

    #[test]
    fn test_mismatch_reports_first_offset() {
        let err = verify_round_trip("PACIENTE ROSA", "PACIENTE RITA").unwrap_err();
        assert!(matches!(err, DeidError::RestorationMismatch { offset: 10 }));
    }

    #[test]
    fn test_truncation_reports_shorter_length() {
        let err = verify_round_trip("abcdef", "abc").unwrap_err();
        assert!(matches!(err, DeidError::RestorationMismatch { offset: 3 }));
    }

    #[test]
    fn test_integrity_intact() {
        let map = sample_map();
        let report = check_placeholder_integrity("NSS [NSS_1], CURP [CURP_0]", &map);
        assert!(report.is_intact());
        assert_eq!(report.expected, 2);
    }

    #[test]
    fn test_integrity_reports_missing_and_unexpected() {
        let map = sample_map();
        let report = check_placeholder_integrity("CURP [CURP_0] [NSS_9]", &map);
        assert!(!report.is_intact());
        assert_eq!(report.missing, vec!["[NSS_1]".to_string()]);
        assert_eq!(report.unexpected, vec!["[NSS_9]".to_string()]);
    }
}
