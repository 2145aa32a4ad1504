pub mod catalog;
pub mod common;

use std::sync::Arc;

use crate::cache::CacheBackend;
use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_query: Arc<crate::services::catalog::ProductQueryService>,
    pub product_admin: Arc<crate::services::catalog::ProductAdminService>,
    pub reference_data: Arc<crate::services::catalog::ReferenceDataService>,
    pub feed: Arc<crate::services::catalog::FeedService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        event_sender: Arc<EventSender>,
        media_base_url: String,
    ) -> Self {
        let product_query = Arc::new(crate::services::catalog::ProductQueryService::new(
            db_pool.clone(),
            cache.clone(),
            event_sender.clone(),
            media_base_url.clone(),
        ));
        let product_admin = Arc::new(crate::services::catalog::ProductAdminService::new(
            db_pool.clone(),
            cache.clone(),
            event_sender,
        ));
        let reference_data = Arc::new(crate::services::catalog::ReferenceDataService::new(
            db_pool.clone(),
            cache.clone(),
        ));
        let feed = Arc::new(crate::services::catalog::FeedService::new(
            db_pool,
            cache,
            media_base_url,
        ));

        Self {
            product_query,
            product_admin,
            reference_data,
            feed,
        }
    }
}
