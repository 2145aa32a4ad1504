/// Catalog services: query, reference data, administration, and the feed
pub mod common;
pub mod feed_service;
pub mod product_admin_service;
pub mod product_query_service;
pub mod reference_data_service;

pub use common::{PagedResult, ProductSummary};
pub use feed_service::{FeedPage, FeedProduct, FeedService, FeedTierLimits};
pub use product_admin_service::{CreateProductInput, ProductAdminService, UpdateProductInput};
pub use product_query_service::{ProductDetail, ProductFilters, ProductQueryService};
pub use reference_data_service::ReferenceDataService;
