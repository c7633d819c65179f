//! Translation backend seam
//!
//! A translator only ever sees sanitized text. It must return placeholder
//! tokens byte-for-byte, though it may move or repeat them.

use async_trait::async_trait;

/// External text transformer (typically a machine translation backend)
#[async_trait]
pub trait Translator: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Transform sanitized text
    async fn translate(&self, text: &str) -> anyhow::Result<String>;
}

/// Returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        Ok(text.to_string())
    }
}
