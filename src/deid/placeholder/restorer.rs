//! Reverse a sanitization

use super::PhiMap;

/// Substitute every placeholder in `text` with its original value
///
/// Every occurrence is replaced, wherever the translator moved it. Tokens are
/// applied longest first so a shorter token never matches inside a longer
/// one. Tokens absent from `text` are skipped; they are reported by
/// placeholder integrity checks, not here.
pub fn restore(text: &str, map: &PhiMap) -> String {
    let mut restored = text.to_string();
    for entry in map.restoration_order() {
        if restored.contains(&entry.placeholder) {
            restored = restored.replace(&entry.placeholder, &entry.value);
        }
    }
    restored
}
