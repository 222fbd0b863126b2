mod audit_log;

pub use audit_log::{Actor, AuditAction, AuditLogRow};
