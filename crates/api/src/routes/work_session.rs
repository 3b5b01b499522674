//! Route definitions for the `/work-sessions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::work_session;
use crate::state::AppState;

/// Routes mounted at `/work-sessions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(work_session::start))
        .route("/end", post(work_session::end))
        .route("/current-status", get(work_session::current_status))
        .route("/my-sessions", get(work_session::my_sessions))
        .route("/employees", get(work_session::employees))
}
