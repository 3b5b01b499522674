//! Route definitions for the `/files` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::file;
use crate::state::AppState;

/// Largest accepted file upload.
const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

/// Routes mounted at `/files`.
///
/// ```text
/// GET, POST          /categories          -> list_categories, create_category
/// GET, PUT, DELETE   /categories/{id}     -> get_category, update_category, delete_category
/// GET, POST          /                    -> list, upload (multipart)
/// GET, PUT, DELETE   /{id}                -> get_by_id, update, delete
/// GET                /{id}/download       -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(file::list_categories).post(file::create_category),
        )
        .route(
            "/categories/{id}",
            get(file::get_category)
                .put(file::update_category)
                .delete(file::delete_category),
        )
        .route(
            "/",
            get(file::list)
                .post(file::upload)
                .layer(DefaultBodyLimit::max(MAX_FILE_BYTES)),
        )
        .route(
            "/{id}",
            get(file::get_by_id).put(file::update).delete(file::delete),
        )
        .route("/{id}/download", get(file::download))
}
