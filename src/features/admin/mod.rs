//! Admin panel.
//!
//! Admins live in their own table and sign in separately from users. Roles gate
//! each endpoint:
//!
//! | Role | Allowed |
//! |------|---------|
//! | Admin | everything, including managing other admins |
//! | Senior Admin | restore decisions, unblock OTPs, account status |
//! | Junior Admin | read-only lists |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::AdminService;
