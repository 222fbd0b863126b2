//! File library: scanned uploads, the PIN/OTP gate, soft delete and download.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::FileService;
