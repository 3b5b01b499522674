//! Route definitions for the `/documents` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::document;
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// GET, POST          /types            -> list_types, create_type
/// GET, PUT, DELETE   /types/{id}       -> get_type, update_type, delete_type
/// GET, POST          /                 -> list, create
/// POST               /search           -> search
/// GET, PUT, DELETE   /{id}             -> get_by_id, update, delete
/// GET, POST          /{id}/shipments   -> list_shipments, ship
/// GET, POST          /{id}/returns     -> list_returns, return_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/types", get(document::list_types).post(document::create_type))
        .route(
            "/types/{id}",
            get(document::get_type)
                .put(document::update_type)
                .delete(document::delete_type),
        )
        .route("/", get(document::list).post(document::create))
        .route("/search", post(document::search))
        .route(
            "/{id}",
            get(document::get_by_id)
                .put(document::update)
                .delete(document::delete),
        )
        .route(
            "/{id}/shipments",
            get(document::list_shipments).post(document::ship),
        )
        .route(
            "/{id}/returns",
            get(document::list_returns).post(document::return_document),
        )
}
