//! Placeholder syntax, the PHI map, sanitization and restoration
//!
//! A placeholder is `[LABEL_N]`: the uppercase PHI type label and a
//! document-wide ordinal. The syntax is reserved; the matcher never reports a
//! span that intersects an existing placeholder, and the registry refuses any
//! rule that would match one.

pub mod map;
pub mod restorer;
pub mod sanitizer;

pub use map::{PhiMap, PhiMapEntry};
pub use restorer::restore;
pub use sanitizer::{sanitize, SanitizationResult};

use crate::deid::models::PhiType;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Build the placeholder token for a type and ordinal
pub fn format_placeholder(phi_type: PhiType, ordinal: usize) -> String {
    format!("[{}_{}]", phi_type.label(), ordinal)
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let labels: Vec<&str> = PhiType::ALL.iter().map(|t| t.label()).collect();
        let pattern = format!(r"\[(?P<label>{})_(?P<ordinal>\d+)\]", labels.join("|"));
        Regex::new(&pattern).expect("placeholder pattern is valid")
    })
}

/// Byte spans of every placeholder token in `text`, in ascending order
pub fn placeholder_spans(text: &str) -> Vec<Range<usize>> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| m.start()..m.end())
        .collect()
}

/// Every placeholder token in `text`, in order of appearance
pub fn placeholder_tokens(text: &str) -> Vec<&str> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// Parse a complete token into its type and ordinal
pub fn parse_placeholder(token: &str) -> Option<(PhiType, usize)> {
    let caps = placeholder_regex().captures(token)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != token.len() {
        return None;
    }
    let phi_type = caps.name("label")?.as_str().parse().ok()?;
    let ordinal = caps.name("ordinal")?.as_str().parse().ok()?;
    Some((phi_type, ordinal))
}

/// Whether `span` intersects any of the (sorted, disjoint) reserved spans
pub(crate) fn intersects_any(span: &Range<usize>, reserved: &[Range<usize>]) -> bool {
    // First reserved span that ends after our start
    let idx = reserved.partition_point(|r| r.end <= span.start);
    reserved
        .get(idx)
        .is_some_and(|r| r.start < span.end)
}
