//! Pure domain logic for SiteDesk.
//!
//! Nothing in this crate performs I/O. The database and HTTP layers call
//! into these modules to decide whether an operation is legal and to compute
//! derived values (availability, progress, worked hours).

pub mod documents;
pub mod error;
pub mod files;
pub mod gpr;
pub mod materials;
pub mod permissions;
pub mod remarks;
pub mod search;
pub mod types;
pub mod work_sessions;
