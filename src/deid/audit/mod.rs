//! Audit trail for detection and restoration passes

pub mod logger;
pub mod record;

pub use logger::{AuditSink, JsonLinesAuditLog, MemoryAuditLog};
pub use record::{hash_text, AuditEvent, AuditRecord, TEXT_HASH_LEN};
