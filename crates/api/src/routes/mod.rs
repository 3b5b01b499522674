pub mod admin;
pub mod auth;
pub mod document;
pub mod file;
pub mod gpr;
pub mod health;
pub mod material;
pub mod project_object;
pub mod remark;
pub mod work_session;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                          WebSocket push channel (?token=)
/// /auth                        register, login, logout, me
/// /admin/users                 user management (admin only)
/// /project-objects             construction sites
/// /customers                   customers
/// /documents                   documents, types, shipments, returns
/// /construction-remarks        remarks, photos, history
/// /files                       file categories, uploads, downloads
/// /materials                   material catalogue
/// /material-requests           purchase requests
/// /material-stocks             stock, reservations, checks
/// /low-stock-materials         low stock listing
/// /check-material-threshold    single-material threshold check
/// /gpr                         work schedule records, weekly reports
/// /work-sessions               employee working time
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/project-objects", project_object::router())
        .nest("/customers", project_object::customer_router())
        .nest("/documents", document::router())
        .nest("/construction-remarks", remark::router())
        .nest("/files", file::router())
        .nest("/materials", material::router())
        .nest("/material-requests", material::request_router())
        .nest("/material-stocks", material::stock_router())
        .merge(material::check_router())
        .nest("/gpr", gpr::router())
        .nest("/work-sessions", work_session::router())
}
