//! Placeholder-to-value map
//!
//! The map is the only artifact that can reverse a sanitization. It holds raw
//! PHI and stays inside the trusted boundary; values are wiped on drop and
//! never printed by `Debug`.

use crate::deid::models::PhiType;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One substituted span
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PhiMapEntry {
    /// Placeholder token, e.g. `[CURP_0]`
    pub placeholder: String,
    /// PHI type of the original value
    #[serde(rename = "type")]
    #[zeroize(skip)]
    pub phi_type: PhiType,
    /// Original value
    pub value: String,
    /// Start offset in the original text
    pub start: usize,
    /// End offset in the original text
    pub end: usize,
    /// Confidence of the match that produced the entry
    pub confidence: f32,
}

impl fmt::Debug for PhiMapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhiMapEntry")
            .field("placeholder", &self.placeholder)
            .field("phi_type", &self.phi_type)
            .field("value", &format_args!("[REDACTED; {} bytes]", self.value.len()))
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// Ordered map from placeholder token to original value
///
/// Serializes as a JSON array of entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhiMap {
    entries: Vec<PhiMapEntry>,
}

impl PhiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: PhiMapEntry) {
        self.entries.push(entry);
    }

    /// Look up the entry for a placeholder token
    pub fn get(&self, placeholder: &str) -> Option<&PhiMapEntry> {
        self.entries.iter().find(|e| e.placeholder == placeholder)
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.get(placeholder).is_some()
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = &PhiMapEntry> {
        self.entries.iter()
    }

    /// Placeholder tokens in document order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.placeholder.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order restoration applies them
    ///
    /// Longest token first, then lexicographic, so `[NAME_1]` is never
    /// substituted inside `[NAME_12]`.
    pub fn restoration_order(&self) -> Vec<&PhiMapEntry> {
        let mut ordered: Vec<&PhiMapEntry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| {
            b.placeholder
                .len()
                .cmp(&a.placeholder.len())
                .then_with(|| a.placeholder.cmp(&b.placeholder))
        });
        ordered
    }

    /// Load a map from its JSON form
    pub fn from_json(json: &str) -> crate::domain::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> crate::domain::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
