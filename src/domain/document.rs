//! Document input types
//!
//! A document is the unit of de-identification: UTF-8 text handed over by an
//! extraction collaborator together with an identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Document identifier newtype wrapper
///
/// # Examples
///
/// ```
/// use phiguard::domain::document::DocumentId;
/// use std::str::FromStr;
///
/// let id = DocumentId::from_str("mr-12-03-25").unwrap();
/// assert_eq!(id.as_str(), "mr-12-03-25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new DocumentId from a string
    ///
    /// Returns `Err` if the identifier is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Document ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a random identifier for documents that arrive without one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the document ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Raw document text plus its identifier
#[derive(Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: DocumentId,
    /// Full UTF-8 text (may contain PHI)
    pub text: String,
}

impl Document {
    /// Create a document with an explicit identifier
    pub fn new(id: DocumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Create a document with a generated identifier
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self::new(DocumentId::generate(), text)
    }
}

// Raw text is never printed
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("text_len", &self.text.len())
            .finish()
    }
}
