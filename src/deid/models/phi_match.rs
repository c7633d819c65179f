//! PHI match data model

use super::PhiType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A detected PHI span
///
/// Offsets are UTF-8 byte offsets into the source text, always on char
/// boundaries, with `start < end`. `value` is exactly `text[start..end]`.
/// The raw value and its context are wiped from memory on drop.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PhiMatch {
    /// Type of PHI
    #[zeroize(skip)]
    pub phi_type: PhiType,
    /// Matched value
    pub value: String,
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Confidence of the rule that produced this match
    pub confidence: f32,
    /// Text window around the match, for debugging
    #[serde(default)]
    pub context: String,
    /// Registration order of the producing rule
    #[serde(default)]
    pub rule_index: usize,
}

impl PhiMatch {
    /// Create a match without context
    pub fn new(
        phi_type: PhiType,
        value: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f32,
    ) -> Self {
        Self {
            phi_type,
            value: value.into(),
            start,
            end,
            confidence,
            context: String::new(),
            rule_index: 0,
        }
    }

    /// Set the context window
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the producing rule's registration index
    pub fn with_rule_index(mut self, rule_index: usize) -> Self {
        self.rule_index = rule_index;
        self
    }

    /// Half-open span of the match
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Span length in bytes (zero for degenerate spans)
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for zero-length or inverted spans
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether two spans share at least one position
    pub fn overlaps(&self, other: &PhiMatch) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the confidence reaches the given threshold
    pub fn is_high_confidence(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

impl fmt::Debug for PhiMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhiMatch")
            .field("phi_type", &self.phi_type)
            .field("value", &format_args!("[REDACTED; {} bytes]", self.value.len()))
            .field("start", &self.start)
            .field("end", &self.end)
            .field("confidence", &self.confidence)
            .field("rule_index", &self.rule_index)
            .finish()
    }
}
