//! Append-only audit trail of state-changing operations.
//!
//! Other features record through [`AuditService::record`]; the admin panel reads
//! the trail through [`AuditService::list`].

pub mod dtos;
pub mod models;
pub mod services;

pub use models::{Actor, AuditAction};
pub use services::AuditService;
