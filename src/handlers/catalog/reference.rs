use axum::{extract::State, routing::get, Router};

use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::AppState;

pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/counties", get(list_counties))
        .route("/units-of-measurement", get(list_units))
}

/// Category tree with sub-categories, variants, and per-category totals
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Category tree")
    ),
    tag = "Reference"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let tree = state
        .services
        .reference_data
        .category_tree()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tree))
}

/// Counties with nested sub-counties
#[utoipa::path(
    get,
    path = "/api/v1/counties",
    responses(
        (status = 200, description = "Geography tree")
    ),
    tag = "Reference"
)]
pub async fn list_counties(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let tree = state
        .services
        .reference_data
        .geography_tree()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tree))
}

/// Units of measurement
#[utoipa::path(
    get,
    path = "/api/v1/units-of-measurement",
    responses(
        (status = 200, description = "Units of measurement")
    ),
    tag = "Reference"
)]
pub async fn list_units(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let units = state
        .services
        .reference_data
        .units_of_measurement()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(units))
}
