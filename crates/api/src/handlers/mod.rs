pub mod admin;
pub mod auth;
pub mod customer;
pub mod document;
pub mod file;
pub mod gpr;
pub mod material;
pub mod project_object;
pub mod remark;
pub mod upload;
pub mod work_session;
