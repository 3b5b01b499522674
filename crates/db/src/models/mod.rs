//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod customer;
pub mod document;
pub mod file;
pub mod gpr;
pub mod material;
pub mod project_object;
pub mod remark;
pub mod user;
pub mod work_session;
