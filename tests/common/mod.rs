use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use soko_api::{
    cache::InMemoryCache,
    config::AppConfig,
    db,
    entities::{
        ad, ad_payment, category, county, product, product_image, product_view, review, store,
        sub_category, unit_of_measurement, AdPaidStatus, AdStatus, ProductStatus,
    },
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

pub const MEDIA_BASE_URL: &str = "https://api.soko.example";

/// Test harness: application state backed by a throwaway SQLite database
/// with the embedded migrations applied.
pub struct TestApp {
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_path = tmp.path().join("soko_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            database_url,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.media_base_url = MEDIA_BASE_URL.to_string();
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db_arc = Arc::new(pool);

        let cache: Arc<dyn soko_api::cache::CacheBackend> = Arc::new(InMemoryCache::new());

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db_arc.clone(),
            cache.clone(),
            Arc::new(event_sender.clone()),
            cfg.media_base_url.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            cache,
        };

        Self { state, _tmp: tmp }
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(name.to_lowercase().replace(' ', "-")),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed category")
    }

    pub async fn seed_sub_category(&self, category_id: Uuid, name: &str) -> sub_category::Model {
        sub_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(category_id),
            name: Set(name.to_string()),
            slug: Set(name.to_lowercase().replace(' ', "-")),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed sub-category")
    }

    pub async fn seed_county(&self, name: &str) -> county::Model {
        county::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed county")
    }

    pub async fn seed_unit(&self, name: &str, abbreviation: &str) -> unit_of_measurement::Model {
        unit_of_measurement::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            abbreviation: Set(abbreviation.to_string()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed unit")
    }

    pub async fn seed_store(&self, name: &str, owner: Uuid) -> store::Model {
        store::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            phone_number: Set(Some("+254700000000".to_string())),
            email: Set(None),
            owner_id: Set(owner),
            owner_username: Set(format!("owner-of-{}", name.to_lowercase().replace(' ', "-"))),
            owner_email: Set(Some("owner@soko.example".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed store")
    }

    /// Insert a product directly, bypassing the admin service, so tests can
    /// pin creation timestamps and lifecycle state.
    pub async fn seed_product(&self, spec: ProductSpec) -> product::Model {
        let id = Uuid::new_v4();
        let created_at = Utc::now() - Duration::minutes(spec.age_minutes);

        let model = product::ActiveModel {
            id: Set(id),
            name: Set(spec.name.clone()),
            slug: Set(format!(
                "{}-{}",
                spec.name.to_lowercase().replace(' ', "-"),
                &id.to_string()[..8]
            )),
            description: Set(spec.description.clone()),
            price: Set(spec.price),
            category_id: Set(spec.category_id),
            sub_category_id: Set(spec.sub_category_id),
            variant_id: Set(None),
            county_id: Set(spec.county_id),
            subcounty_id: Set(None),
            town: Set(spec.town.clone()),
            unit_of_measurement_id: Set(None),
            store_id: Set(spec.store_id),
            status: Set(spec.status),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product");

        for (idx, url) in spec.images.iter().enumerate() {
            product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(model.id),
                url: Set(url.clone()),
                sort_order: Set(idx as i32),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to seed product image");
        }

        model
    }

    pub async fn seed_views(&self, product_id: Uuid, count: usize) {
        for _ in 0..count {
            product_view::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                viewed_at: Set(Utc::now()),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to seed view");
        }
    }

    pub async fn seed_review(&self, product_id: Uuid, rating: i16, body: &str) -> review::Model {
        review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            reviewer_name: Set("Wanjiku".to_string()),
            reviewer_email: Set(Some("wanjiku@soko.example".to_string())),
            rating: Set(rating),
            body: Set(body.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed review")
    }

    /// Create an active, fully paid ad for a product, with one settled
    /// payment per amount given.
    pub async fn seed_paid_ad(&self, product_id: Uuid, amounts: &[Decimal]) -> ad::Model {
        let ad = ad::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            status: Set(AdStatus::Active),
            paid_status: Set(AdPaidStatus::Paid),
            starts_on: Set(Utc::now() - Duration::days(1)),
            ends_on: Set(Utc::now() + Duration::days(29)),
            monthly_cost: Set(dec!(1000)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed ad");

        for amount in amounts {
            ad_payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                ad_id: Set(ad.id),
                amount: Set(*amount),
                paid_at: Set(Utc::now()),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to seed ad payment");
        }

        ad
    }

    /// An ad that does not qualify as boosted (unpaid).
    pub async fn seed_unpaid_ad(&self, product_id: Uuid) -> ad::Model {
        ad::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            status: Set(AdStatus::Active),
            paid_status: Set(AdPaidStatus::NotPaid),
            starts_on: Set(Utc::now() - Duration::days(1)),
            ends_on: Set(Utc::now() + Duration::days(29)),
            monthly_cost: Set(dec!(1000)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed ad")
    }
}

/// Seed parameters for a directly inserted product
pub struct ProductSpec {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub town: Option<String>,
    pub store_id: Uuid,
    pub status: ProductStatus,
    /// Minutes in the past for created_at; larger = older
    pub age_minutes: i64,
    pub images: Vec<String>,
}

impl ProductSpec {
    pub fn new(name: &str, category_id: Uuid, store_id: Uuid) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{} description", name),
            price: dec!(49.99),
            category_id,
            sub_category_id: None,
            county_id: None,
            town: None,
            store_id,
            status: ProductStatus::Active,
            age_minutes: 0,
            images: Vec::new(),
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.status = ProductStatus::Deactivated;
        self
    }

    pub fn aged(mut self, minutes: i64) -> Self {
        self.age_minutes = minutes;
        self
    }

    pub fn in_county(mut self, county_id: Uuid) -> Self {
        self.county_id = Some(county_id);
        self
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_images(mut self, images: &[&str]) -> Self {
        self.images = images.iter().map(|s| s.to_string()).collect();
        self
    }
}
