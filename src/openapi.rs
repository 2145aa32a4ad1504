use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Soko API",
        version = "1.0.0",
        description = "Marketplace catalog API: filtered product browsing, reference data, and the boosted/most-viewed storefront feed.",
        contact(name = "Soko Engineering", email = "eng@soko.example")
    ),
    paths(
        // Products
        crate::handlers::catalog::products::list_products,
        crate::handlers::catalog::products::get_product,
        crate::handlers::catalog::products::record_product_view,
        crate::handlers::catalog::products::top_viewed_products,
        crate::handlers::catalog::products::create_product,
        crate::handlers::catalog::products::update_product,
        crate::handlers::catalog::products::deactivate_product,
        crate::handlers::catalog::products::reactivate_product,
        crate::handlers::catalog::products::delete_product,

        // Feed
        crate::handlers::catalog::feed::home_feed,

        // Reference data
        crate::handlers::catalog::reference::list_categories,
        crate::handlers::catalog::reference::list_counties,
        crate::handlers::catalog::reference::list_units,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::services::catalog::ProductSummary,
            crate::services::catalog::ProductDetail,
            crate::services::catalog::FeedPage,
            crate::services::catalog::FeedProduct,
            crate::handlers::catalog::products::CreateProductRequest,
            crate::handlers::catalog::products::UpdateProductRequest,
        )
    ),
    tags(
        (name = "Products", description = "Catalog browsing and owner-scoped product management"),
        (name = "Feed", description = "Composed storefront home feed"),
        (name = "Reference", description = "Categories, geography, and units")
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDocV1::openapi())
}
