//! Route definitions for materials, stock, purchase requests, and checks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::material;
use crate::state::AppState;

/// Routes mounted at `/materials`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(material::list_materials).post(material::create_material),
        )
        .route(
            "/{id}",
            get(material::get_material)
                .put(material::update_material)
                .delete(material::delete_material),
        )
}

/// Routes mounted at `/material-requests`.
pub fn request_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(material::list_requests).post(material::create_request),
        )
        .route(
            "/{id}",
            get(material::get_request).put(material::update_request),
        )
}

/// Routes mounted at `/material-stocks`.
///
/// ```text
/// GET, POST   /                          -> list_stocks, create_stock
/// GET, PUT    /{id}                      -> get_stock, update_stock
/// GET         /by-material/{material_id} -> get_stock_by_material
/// POST        /check-low-stock           -> check_low_stock
/// POST        /check-section-needs       -> check_section_needs
/// POST        /reserve                   -> reserve
/// POST        /release                   -> release
/// ```
pub fn stock_router() -> Router<AppState> {
    Router::new()
        .route("/", get(material::list_stocks).post(material::create_stock))
        .route(
            "/{id}",
            get(material::get_stock).put(material::update_stock),
        )
        .route(
            "/by-material/{material_id}",
            get(material::get_stock_by_material),
        )
        .route("/check-low-stock", post(material::check_low_stock))
        .route("/check-section-needs", post(material::check_section_needs))
        .route("/reserve", post(material::reserve))
        .route("/release", post(material::release))
}

/// Stock check routes mounted at the API root.
///
/// ```text
/// GET  /low-stock-materials                    -> list_low_stock
/// POST /check-material-threshold/{material_id} -> check_threshold
/// ```
pub fn check_router() -> Router<AppState> {
    Router::new()
        .route("/low-stock-materials", get(material::list_low_stock))
        .route(
            "/check-material-threshold/{material_id}",
            post(material::check_threshold),
        )
}
