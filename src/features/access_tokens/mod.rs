//! Time-boxed file access tokens.
//!
//! A token is an HS256 JWT over `{fileId, userId, iat, exp}` that is also stored
//! server-side, so it can be revoked before it expires.

mod codec;

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod ttl;

pub use services::AccessTokenService;
