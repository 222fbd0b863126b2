//! User profile management feature.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Get the caller's profile |
//! | PATCH | `/api/users/me` | Update username, phone, website, address or status |
//! | POST | `/api/users/me/avatar` | Upload an avatar image |
//! | PUT | `/api/users/me/pin` | Set the 6-digit access PIN |
//! | POST | `/api/users/me/deactivate` | Deactivate the account (PIN gated) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::UserProfileService;
