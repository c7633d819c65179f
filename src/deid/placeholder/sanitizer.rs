//! Replace resolved PHI spans with placeholders

use super::{format_placeholder, placeholder_tokens, PhiMap, PhiMapEntry};
use crate::deid::detector::ResolvedMatchSet;
use crate::deid::models::PhiMatch;
use crate::domain::{DeidError, DocumentId, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Sanitized text plus the map that reverses it
#[derive(Debug, Clone, Serialize)]
pub struct SanitizationResult {
    pub document_id: DocumentId,
    pub sanitized_text: String,
    #[serde(skip)]
    pub map: PhiMap,
}

impl SanitizationResult {
    /// Number of substituted spans
    pub fn phi_count(&self) -> usize {
        self.map.len()
    }
}

/// Substitute every resolved span of `text` with a placeholder
///
/// Ordinals come from one counter per document, assigned in ascending start
/// order. Spans are offsets into the original `text`; the output is built
/// in one forward pass. An ordinal whose token already occurs literally in
/// `text` is skipped, which keeps restoration unambiguous when an already
/// sanitized text is sanitized again.
pub fn sanitize(
    document_id: &DocumentId,
    text: &str,
    matches: &ResolvedMatchSet,
) -> Result<SanitizationResult> {
    validate_spans(text, matches)?;

    let existing: HashSet<&str> = placeholder_tokens(text).into_iter().collect();
    let mut map = PhiMap::new();
    let mut next_ordinal = 0usize;
    for m in matches.iter() {
        let placeholder = loop {
            let candidate = format_placeholder(m.phi_type, next_ordinal);
            next_ordinal += 1;
            if !existing.contains(candidate.as_str()) {
                break candidate;
            }
        };
        map.push(PhiMapEntry {
            placeholder,
            phi_type: m.phi_type,
            value: m.value.clone(),
            start: m.start,
            end: m.end,
            confidence: m.confidence,
        });
    }

    let mut sanitized_text = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (m, entry) in matches.iter().zip(map.iter()) {
        sanitized_text.push_str(&text[cursor..m.start]);
        sanitized_text.push_str(&entry.placeholder);
        cursor = m.end;
    }
    sanitized_text.push_str(&text[cursor..]);

    Ok(SanitizationResult {
        document_id: document_id.clone(),
        sanitized_text,
        map,
    })
}

fn validate_spans(text: &str, matches: &[PhiMatch]) -> Result<()> {
    let mut previous_end = 0usize;
    for m in matches {
        let invalid = || DeidError::InvalidSpan {
            start: m.start,
            end: m.end,
            len: text.len(),
        };
        if m.is_empty()
            || m.end > text.len()
            || m.start < previous_end
            || !text.is_char_boundary(m.start)
            || !text.is_char_boundary(m.end)
        {
            return Err(invalid());
        }
        if text[m.span()] != m.value {
            return Err(invalid());
        }
        previous_end = m.end;
    }
    Ok(())
}
