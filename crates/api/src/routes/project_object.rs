//! Route definitions for `/project-objects` and `/customers`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{customer, project_object};
use crate::state::AppState;

/// Routes mounted at `/project-objects`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project_object::list).post(project_object::create))
        .route(
            "/{id}",
            get(project_object::get_by_id)
                .put(project_object::update)
                .delete(project_object::delete),
        )
}

/// Routes mounted at `/customers`.
pub fn customer_router() -> Router<AppState> {
    Router::new()
        .route("/", get(customer::list).post(customer::create))
        .route(
            "/{id}",
            get(customer::get_by_id)
                .put(customer::update)
                .delete(customer::delete),
        )
}
