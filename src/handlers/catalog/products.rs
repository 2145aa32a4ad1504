use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::services::catalog::{CreateProductInput, ProductFilters, UpdateProductInput};
use crate::AppState;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/top-viewed", get(top_viewed_products))
        .route("/:id", get(get_product))
        .route("/:id/views", post(record_product_view))
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id/deactivate", post(deactivate_product))
        .route("/:id/reactivate", post(reactivate_product))
        .route("/:id", delete(delete_product))
}

/// Query parameters for product listings
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
    pub county: Option<Uuid>,
    pub subcounty: Option<Uuid>,
    pub category: Option<Uuid>,
    pub sub_category: Option<Uuid>,
    pub variant: Option<Uuid>,
    /// Case-insensitive substring match against name or description
    pub q: Option<String>,
}

/// List products, filtered and paginated
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Paginated product summaries", body = crate::services::catalog::PagedResult<crate::services::catalog::ProductSummary>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let filters = ProductFilters {
        county: query.county,
        subcounty: query.subcounty,
        category: query.category,
        sub_category: query.sub_category,
        variant: query.variant,
        search: query.q,
    };

    let result = state
        .services
        .product_query
        .fetch_products(filters, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(result))
}

/// Fetch one product with images, reviews, and display data
#[utoipa::path(
    get,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product detail", body = crate::services::catalog::ProductDetail),
        (status = 404, description = "Unknown or deactivated product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .product_query
        .get_product(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))?;

    Ok(success_response(detail))
}

/// Record one view of a product
#[utoipa::path(
    post,
    path = "/api/v1/products/:id/views",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "View recorded"),
        (status = 404, description = "Unknown or deactivated product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn record_product_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .product_query
        .record_view(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TopViewedQuery {
    pub limit: Option<u64>,
}

/// Most-viewed active products
#[utoipa::path(
    get,
    path = "/api/v1/products/top-viewed",
    params(TopViewedQuery),
    responses(
        (status = 200, description = "Products ranked by view count")
    ),
    tag = "Products"
)]
pub async fn top_viewed_products(
    State(state): State<AppState>,
    Query(query): Query<TopViewedQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = query.limit.map(|l| l.clamp(1, state.config.api_max_page_size));
    let result = state
        .services
        .product_query
        .top_viewed(limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(result))
}

/// Request payload for creating a product
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub subcounty_id: Option<Uuid>,
    pub town: Option<String>,
    pub unit_of_measurement_id: Option<Uuid>,
    pub store_id: Uuid,
    /// Image references in display order
    #[serde(default)]
    pub images: Vec<String>,
}

/// Create a product under the caller's store
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller does not own the store", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug allocation exhausted", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateProductInput {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        category_id: payload.category_id,
        sub_category_id: payload.sub_category_id,
        variant_id: payload.variant_id,
        county_id: payload.county_id,
        subcounty_id: payload.subcounty_id,
        town: payload.town,
        unit_of_measurement_id: payload.unit_of_measurement_id,
        store_id: payload.store_id,
        images: payload.images,
    };

    let product = state
        .services
        .product_admin
        .create_product(input, user.id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// Request payload for partially updating a product
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub subcounty_id: Option<Uuid>,
    pub town: Option<String>,
    pub unit_of_measurement_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
}

/// Update a product (partial replacement; slug regenerates only on rename)
#[utoipa::path(
    put,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller does not own the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateProductInput {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        category_id: payload.category_id,
        sub_category_id: payload.sub_category_id,
        variant_id: payload.variant_id,
        county_id: payload.county_id,
        subcounty_id: payload.subcounty_id,
        town: payload.town,
        unit_of_measurement_id: payload.unit_of_measurement_id,
        images: payload.images,
    };

    let product = state
        .services
        .product_admin
        .update_product(id, input, user.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Take a product out of public listings
#[utoipa::path(
    post,
    path = "/api/v1/products/:id/deactivate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 403, description = "Caller does not own the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn deactivate_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .product_admin
        .deactivate_product(id, user.id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Return a deactivated product to public listings
#[utoipa::path(
    post,
    path = "/api/v1/products/:id/reactivate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product reactivated"),
        (status = 403, description = "Caller does not own the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn reactivate_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .product_admin
        .reactivate_product(id, user.id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Hard-delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Caller does not own the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .product_admin
        .delete_product(id, user.id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
