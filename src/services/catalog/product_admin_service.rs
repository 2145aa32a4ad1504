use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QuerySelect, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{keys, CacheBackend};
use crate::db::DbPool;
use crate::entities::{
    ad, ad_payment, category, county, product, product_image, product_view, review, store,
    sub_category, sub_county, unit_of_measurement, variant, ProductStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::common::CatalogCache;

/// Upper bound on insert attempts when racing for a slug. The counter
/// suffix makes exhaustion practically unreachable, but the loop must
/// terminate rather than spin.
const MAX_SLUG_ATTEMPTS: usize = 20;

/// Store-owner-scoped product mutations: create, partial edit, lifecycle
/// transitions, and hard delete. Mutations that change per-category counts
/// clear the category-tree cache entry.
#[derive(Clone)]
pub struct ProductAdminService {
    db: Arc<DbPool>,
    cache: CatalogCache,
    event_sender: Arc<EventSender>,
}

impl ProductAdminService {
    pub fn new(
        db: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            cache: CatalogCache::new(cache),
            event_sender,
        }
    }

    /// Create a new product under the caller's store.
    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
        owner: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        let store = store::Entity::find_by_id(input.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Store {} does not exist", input.store_id))
            })?;
        if store.owner_id != owner {
            return Err(ServiceError::Forbidden(
                "Only the store owner may create products for it".to_string(),
            ));
        }

        self.ensure_references_exist(
            Some(input.category_id),
            input.sub_category_id,
            input.variant_id,
            input.county_id,
            input.subcounty_id,
            input.unit_of_measurement_id,
        )
        .await?;

        let product_id = Uuid::new_v4();
        let base_slug = slugify_or_fallback(&name, product_id);

        // Insert, detect unique violation, retry with the next suffix: two
        // concurrent creations of "Blue Shoes" land on blue-shoes and
        // blue-shoes-1 instead of colliding.
        let mut attempts = 0;
        let inserted = loop {
            let slug = next_free_slug(&self.db, &base_slug, None).await?;
            let now = Utc::now();
            let model = product::ActiveModel {
                id: Set(product_id),
                name: Set(name.clone()),
                slug: Set(slug),
                description: Set(input.description.clone().unwrap_or_default()),
                price: Set(input.price),
                category_id: Set(input.category_id),
                sub_category_id: Set(input.sub_category_id),
                variant_id: Set(input.variant_id),
                county_id: Set(input.county_id),
                subcounty_id: Set(input.subcounty_id),
                town: Set(input.town.clone()),
                unit_of_measurement_id: Set(input.unit_of_measurement_id),
                store_id: Set(input.store_id),
                status: Set(ProductStatus::Active),
                created_at: Set(now),
                updated_at: Set(now),
            };

            match model.insert(&*self.db).await {
                Ok(created) => break created,
                Err(err) => match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        attempts += 1;
                        if attempts >= MAX_SLUG_ATTEMPTS {
                            return Err(ServiceError::Conflict(format!(
                                "Could not allocate a unique slug for '{}'",
                                name
                            )));
                        }
                        warn!(base_slug, attempts, "Slug collision on insert, retrying");
                    }
                    _ => return Err(err.into()),
                },
            }
        };

        self.append_images(product_id, &input.images, 0).await?;

        self.cache.delete(keys::CATEGORY_TREE_KEY).await;
        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!(product_id = %inserted.id, slug = %inserted.slug, "Product created");
        Ok(inserted)
    }

    /// Partially update a product. Only supplied fields change; the slug is
    /// regenerated only when the name changes.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
        owner: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.owned_product(id, owner).await?;

        self.ensure_references_exist(
            input.category_id,
            input.sub_category_id,
            input.variant_id,
            input.county_id,
            input.subcounty_id,
            input.unit_of_measurement_id,
        )
        .await?;

        let name_changed = input
            .name
            .as_deref()
            .map(str::trim)
            .map(|n| !n.is_empty() && n != existing.name)
            .unwrap_or(false);

        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
        }

        let mut active: product::ActiveModel = existing.clone().into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product name cannot be blank".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(sub_category_id) = input.sub_category_id {
            active.sub_category_id = Set(Some(sub_category_id));
        }
        if let Some(variant_id) = input.variant_id {
            active.variant_id = Set(Some(variant_id));
        }
        if let Some(county_id) = input.county_id {
            active.county_id = Set(Some(county_id));
        }
        if let Some(subcounty_id) = input.subcounty_id {
            active.subcounty_id = Set(Some(subcounty_id));
        }
        if let Some(town) = input.town {
            active.town = Set(Some(town));
        }
        if let Some(unit_id) = input.unit_of_measurement_id {
            active.unit_of_measurement_id = Set(Some(unit_id));
        }

        active.updated_at = Set(Utc::now());

        let mut attempts = 0;
        let updated = loop {
            if name_changed {
                let new_name = match &active.name {
                    sea_orm::ActiveValue::Set(n) => n.clone(),
                    _ => existing.name.clone(),
                };
                let base_slug = slugify_or_fallback(&new_name, id);
                let slug = next_free_slug(&self.db, &base_slug, Some(id)).await?;
                active.slug = Set(slug);
            }

            match active.clone().update(&*self.db).await {
                Ok(updated) => break updated,
                Err(err) => match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) if name_changed => {
                        attempts += 1;
                        if attempts >= MAX_SLUG_ATTEMPTS {
                            return Err(ServiceError::Conflict(
                                "Could not allocate a unique slug for the renamed product"
                                    .to_string(),
                            ));
                        }
                        warn!(product_id = %id, attempts, "Slug collision on update, retrying");
                    }
                    _ => return Err(err.into()),
                },
            }
        };

        if let Some(images) = &input.images {
            let next_order = product_image::Entity::find()
                .filter(product_image::Column::ProductId.eq(id))
                .select_only()
                .column_as(product_image::Column::SortOrder.max(), "max_order")
                .into_tuple::<Option<i32>>()
                .one(&*self.db)
                .await?
                .flatten()
                .map(|max| max + 1)
                .unwrap_or(0);
            self.append_images(id, images, next_order).await?;
        }

        self.invalidate_product_caches(id).await;
        self.event_sender.send_or_log(Event::ProductUpdated(id)).await;

        info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Take a product out of every public listing.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, id: Uuid, owner: Uuid) -> Result<(), ServiceError> {
        self.transition_status(id, owner, ProductStatus::Deactivated)
            .await?;
        self.event_sender
            .send_or_log(Event::ProductDeactivated(id))
            .await;
        Ok(())
    }

    /// Return a deactivated product to public listings.
    #[instrument(skip(self))]
    pub async fn reactivate_product(&self, id: Uuid, owner: Uuid) -> Result<(), ServiceError> {
        self.transition_status(id, owner, ProductStatus::Active)
            .await?;
        self.event_sender
            .send_or_log(Event::ProductReactivated(id))
            .await;
        Ok(())
    }

    /// Hard-delete a product and its dependent rows. Terminal.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid, owner: Uuid) -> Result<(), ServiceError> {
        let existing = self.owned_product(id, owner).await?;

        let ad_ids: Vec<Uuid> = ad::Entity::find()
            .filter(ad::Column::ProductId.eq(id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        if !ad_ids.is_empty() {
            ad_payment::Entity::delete_many()
                .filter(ad_payment::Column::AdId.is_in(ad_ids))
                .exec(&*self.db)
                .await?;
            ad::Entity::delete_many()
                .filter(ad::Column::ProductId.eq(id))
                .exec(&*self.db)
                .await?;
        }

        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&*self.db)
            .await?;
        product_view::Entity::delete_many()
            .filter(product_view::Column::ProductId.eq(id))
            .exec(&*self.db)
            .await?;
        review::Entity::delete_many()
            .filter(review::Column::ProductId.eq(id))
            .exec(&*self.db)
            .await?;

        existing.delete(&*self.db).await?;

        self.invalidate_product_caches(id).await;
        self.event_sender.send_or_log(Event::ProductDeleted(id)).await;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        owner: Uuid,
        status: ProductStatus,
    ) -> Result<(), ServiceError> {
        let existing = self.owned_product(id, owner).await?;

        let mut active: product::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.invalidate_product_caches(id).await;
        Ok(())
    }

    /// Load a product regardless of status and enforce that the caller owns
    /// its store.
    async fn owned_product(&self, id: Uuid, owner: Uuid) -> Result<product::Model, ServiceError> {
        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let store = store::Entity::find_by_id(existing.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Store {} referenced by product {} is missing",
                    existing.store_id, id
                ))
            })?;

        if store.owner_id != owner {
            return Err(ServiceError::Forbidden(
                "Only the owning store may modify this product".to_string(),
            ));
        }

        Ok(existing)
    }

    async fn append_images(
        &self,
        product_id: Uuid,
        urls: &[String],
        start_order: i32,
    ) -> Result<(), ServiceError> {
        for (idx, url) in urls.iter().enumerate() {
            let image = product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                url: Set(url.clone()),
                sort_order: Set(start_order + idx as i32),
            };
            image.insert(&*self.db).await?;
        }
        Ok(())
    }

    async fn ensure_references_exist(
        &self,
        category_id: Option<Uuid>,
        sub_category_id: Option<Uuid>,
        variant_id: Option<Uuid>,
        county_id: Option<Uuid>,
        subcounty_id: Option<Uuid>,
        unit_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            if category::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "Category {} does not exist",
                    id
                )));
            }
        }
        if let Some(id) = sub_category_id {
            if sub_category::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "Sub-category {} does not exist",
                    id
                )));
            }
        }
        if let Some(id) = variant_id {
            if variant::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "Variant {} does not exist",
                    id
                )));
            }
        }
        if let Some(id) = county_id {
            if county::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "County {} does not exist",
                    id
                )));
            }
        }
        if let Some(id) = subcounty_id {
            if sub_county::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "Sub-county {} does not exist",
                    id
                )));
            }
        }
        if let Some(id) = unit_id {
            if unit_of_measurement::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "Unit of measurement {} does not exist",
                    id
                )));
            }
        }
        Ok(())
    }

    async fn invalidate_product_caches(&self, id: Uuid) {
        self.cache.delete(keys::CATEGORY_TREE_KEY).await;
        self.cache.delete(&keys::product_detail_key(id)).await;
    }
}

/// Lowercase, alphanumeric, dash-separated slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut prev_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !prev_dash && !slug.is_empty() {
                slug.push('-');
                prev_dash = true;
            }
        }
    }

    slug.trim_matches('-').to_string()
}

fn slugify_or_fallback(name: &str, fallback: Uuid) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Pick the first free slug for `base`: the base itself, then `base-1`,
/// `base-2`, … against the slugs currently in the store.
async fn next_free_slug(
    db: &DbPool,
    base: &str,
    exclude: Option<Uuid>,
) -> Result<String, ServiceError> {
    let mut query = product::Entity::find()
        .filter(product::Column::Slug.like(format!("{}%", base)));
    if let Some(id) = exclude {
        query = query.filter(product::Column::Id.ne(id));
    }

    let taken: HashSet<String> = query
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.slug)
        .collect();

    Ok(first_free_slug(base, &taken))
}

fn first_free_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateProductInput {
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

/// Input for partially updating a product. Absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
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
    /// Additional images appended after the existing ones
    pub images: Option<Vec<String>>,
}
