//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every route requires an administrator.
///
/// ```text
/// GET    /users                         -> list_users
/// GET    /users/{id}                    -> get_user
/// PUT    /users/{id}                    -> update_user
/// DELETE /users/{id}                    -> delete_user
/// POST   /users/{id}/activate           -> activate_user
/// POST   /users/{id}/deactivate         -> deactivate_user
/// POST   /users/{id}/promote-admin      -> promote_admin
/// POST   /users/{id}/demote-admin       -> demote_admin
/// PUT    /users/{id}/permissions        -> set_permissions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/users/{id}/activate", post(admin::activate_user))
        .route("/users/{id}/deactivate", post(admin::deactivate_user))
        .route("/users/{id}/promote-admin", post(admin::promote_admin))
        .route("/users/{id}/demote-admin", post(admin::demote_admin))
        .route("/users/{id}/permissions", put(admin::set_permissions))
}
