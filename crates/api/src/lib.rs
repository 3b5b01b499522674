//! SiteDesk API server library.
//!
//! Config, state, error handling, routes, the material checker and the
//! WebSocket registry live here so the binaries and integration tests share
//! them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod material_checker;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
