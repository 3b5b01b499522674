//! Route definitions for the `/gpr` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::gpr;
use crate::state::AppState;

/// Routes mounted at `/gpr`.
///
/// ```text
/// GET, POST          /records                          -> list_records, create_record
/// GET, PUT, DELETE   /records/{id}                     -> get_record, update_record, delete_record
/// POST               /records/{id}/check-materials     -> check_materials
/// POST               /records/{id}/reserve-materials   -> reserve_materials
/// POST               /records/{id}/usage               -> record_usage
/// POST               /weekly-report                    -> generate_weekly_report
/// GET                /weekly-report/{week_start_date}  -> get_weekly_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(gpr::list_records).post(gpr::create_record))
        .route(
            "/records/{id}",
            get(gpr::get_record)
                .put(gpr::update_record)
                .delete(gpr::delete_record),
        )
        .route("/records/{id}/check-materials", post(gpr::check_materials))
        .route(
            "/records/{id}/reserve-materials",
            post(gpr::reserve_materials),
        )
        .route("/records/{id}/usage", post(gpr::record_usage))
        .route("/weekly-report", post(gpr::generate_weekly_report))
        .route(
            "/weekly-report/{week_start_date}",
            get(gpr::get_weekly_report),
        )
}
