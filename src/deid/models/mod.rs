//! Data models shared by the matcher, resolver, sanitizer and audit logger

pub mod phi_match;
pub mod phi_type;

pub use phi_match::PhiMatch;
pub use phi_type::PhiType;
