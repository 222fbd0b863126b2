//! Modules layer - clients for the external services
//!
//! Object storage, malware scanning and transactional email.

pub mod email;
pub mod scanner;
pub mod storage;
