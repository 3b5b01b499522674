//! Route definitions for the `/construction-remarks` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;

use crate::handlers::remark;
use crate::state::AppState;

/// Largest accepted photo upload.
const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

/// Routes mounted at `/construction-remarks`.
///
/// ```text
/// GET, POST          /                               -> list, create
/// GET                /search                         -> search
/// GET                /overdue                        -> list_overdue
/// GET                /status/{status}                -> list_by_status
/// GET                /project-object/{id}            -> list_by_project_object
/// GET                /project-object/{id}/summary    -> project_object_summary
/// GET, PUT, DELETE   /{id}                           -> get_by_id, update, delete (admin)
/// GET, POST          /{id}/photos                    -> list_photos, upload_photo (multipart)
/// GET                /{id}/history                   -> list_history
/// PUT, DELETE        /photos/{photo_id}              -> update_photo, delete_photo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(remark::list).post(remark::create))
        .route("/search", get(remark::search))
        .route("/overdue", get(remark::list_overdue))
        .route("/status/{status}", get(remark::list_by_status))
        .route("/project-object/{id}", get(remark::list_by_project_object))
        .route(
            "/project-object/{id}/summary",
            get(remark::project_object_summary),
        )
        .route(
            "/photos/{photo_id}",
            put(remark::update_photo).delete(remark::delete_photo),
        )
        .route(
            "/{id}",
            get(remark::get_by_id)
                .put(remark::update)
                .delete(remark::delete),
        )
        .route(
            "/{id}/photos",
            get(remark::list_photos)
                .post(remark::upload_photo)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
        .route("/{id}/history", get(remark::list_history))
}
