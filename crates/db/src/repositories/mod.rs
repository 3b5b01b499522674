//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Methods that enforce domain rules inside a
//! transaction return [`crate::StoreError`]; plain queries return `sqlx::Error`.

pub mod customer_repo;
pub mod document_repo;
pub mod file_repo;
pub mod gpr_repo;
pub mod material_repo;
pub mod project_object_repo;
pub mod remark_repo;
pub mod user_repo;
pub mod work_session_repo;

pub use customer_repo::CustomerRepo;
pub use document_repo::{DocumentRepo, DocumentTypeRepo};
pub use file_repo::{FileCategoryRepo, UploadedFileRepo};
pub use gpr_repo::{GprRepo, WeeklyReportRepo};
pub use material_repo::{MaterialRepo, MaterialRequestRepo, MaterialStockRepo};
pub use project_object_repo::ProjectObjectRepo;
pub use remark_repo::RemarkRepo;
pub use user_repo::UserRepo;
pub use work_session_repo::WorkSessionRepo;
