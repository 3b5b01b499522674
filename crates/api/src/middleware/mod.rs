//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the active user behind a Bearer token.
//! - [`rbac::RequireAdmin`] -- additionally requires the admin flag.

pub mod auth;
pub mod rbac;
