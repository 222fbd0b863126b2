pub mod access_tokens;
pub mod admin;
pub mod audit;
pub mod auth;
pub mod files;
pub mod recycle_bin;
pub mod shares;
pub mod users;
