use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::{keys, CacheBackend};
use crate::db::DbPool;
use crate::entities::{
    category, product, product_image, product_view, review, store, sub_category, variant,
    ProductStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::common::{
    resolve_image_url, unescape_html, CatalogCache, DisplayMaps, PagedResult, ProductSummary,
};

const TOP_VIEWED_DEFAULT_LIMIT: u64 = 20;

/// Read side of the catalog: filtered listings, per-product detail, and the
/// view-count plumbing behind the most-viewed rankings. Every read goes
/// through the cache first and falls back to a live query.
#[derive(Clone)]
pub struct ProductQueryService {
    db: Arc<DbPool>,
    cache: CatalogCache,
    event_sender: Arc<EventSender>,
    media_base_url: String,
}

impl ProductQueryService {
    pub fn new(
        db: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        event_sender: Arc<EventSender>,
        media_base_url: String,
    ) -> Self {
        Self {
            db,
            cache: CatalogCache::new(cache),
            event_sender,
            media_base_url,
        }
    }

    /// List products matching the supplied filters, newest first.
    ///
    /// The predicate is the conjunction of one equality clause per present
    /// filter plus the always-on active check; a search term matches name or
    /// description case-insensitively. Requesting a page past the end yields
    /// an empty page, not an error.
    #[instrument(skip(self))]
    pub async fn fetch_products(
        &self,
        filters: ProductFilters,
        page: u64,
        per_page: u64,
    ) -> Result<PagedResult<ProductSummary>, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let cache_key = filters.cache_key(page, per_page);
        if let Some(cached) = self.cache.get_json(&cache_key).await {
            return Ok(cached);
        }

        let mut query = product::Entity::find()
            .filter(product::Column::Status.eq(ProductStatus::Active));

        if let Some(county) = filters.county {
            query = query.filter(product::Column::CountyId.eq(county));
        }
        if let Some(subcounty) = filters.subcounty {
            query = query.filter(product::Column::SubcountyId.eq(subcounty));
        }
        if let Some(category) = filters.category {
            query = query.filter(product::Column::CategoryId.eq(category));
        }
        if let Some(sub_category) = filters.sub_category {
            query = query.filter(product::Column::SubCategoryId.eq(sub_category));
        }
        if let Some(variant) = filters.variant {
            query = query.filter(product::Column::VariantId.eq(variant));
        }
        if let Some(term) = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let needle = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                            .like(needle.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                            .like(needle),
                    ),
            );
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        let maps = DisplayMaps::load(&self.db, &products, &self.media_base_url).await?;
        let items = products.iter().map(|p| maps.build_summary(p)).collect();

        let result = PagedResult::new(items, total, page, per_page);
        self.cache
            .put_json(&cache_key, &result, keys::PRODUCT_LIST_TTL)
            .await;

        Ok(result)
    }

    /// Fetch one active product with images, reviews, and denormalized
    /// display data. Unknown or deactivated ids resolve to `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<Option<ProductDetail>, ServiceError> {
        let cache_key = keys::product_detail_key(id);
        if let Some(cached) = self.cache.get_json(&cache_key).await {
            return Ok(Some(cached));
        }

        let Some(product) = product::Entity::find_by_id(id)
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let images: Vec<String> = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .order_by_asc(product_image::Column::SortOrder)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|img| resolve_image_url(&img.url, &self.media_base_url))
            .collect();

        let reviews: Vec<ReviewItem> = review::Entity::find()
            .filter(review::Column::ProductId.eq(id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| ReviewItem {
                id: r.id,
                name: r.reviewer_name,
                rating: r.rating,
                date: r.created_at.to_rfc3339(),
                review: r.body,
            })
            .collect();

        let category = category::Entity::find_by_id(product.category_id)
            .one(&*self.db)
            .await?;

        let sub_category = match product.sub_category_id {
            Some(sub_id) => sub_category::Entity::find_by_id(sub_id).one(&*self.db).await?,
            None => None,
        };
        let sub_category_parent = match &sub_category {
            Some(sub) => category::Entity::find_by_id(sub.category_id)
                .one(&*self.db)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let variant = match product.variant_id {
            Some(variant_id) => variant::Entity::find_by_id(variant_id).one(&*self.db).await?,
            None => None,
        };
        let variant_parent = match &variant {
            Some(v) => sub_category::Entity::find_by_id(v.sub_category_id)
                .one(&*self.db)
                .await?
                .map(|s| s.name),
            None => None,
        };

        let county = match product.county_id {
            Some(county_id) => crate::entities::county::Entity::find_by_id(county_id)
                .one(&*self.db)
                .await?
                .map(|c| c.name),
            None => None,
        };
        let subcounty = match product.subcounty_id {
            Some(subcounty_id) => crate::entities::sub_county::Entity::find_by_id(subcounty_id)
                .one(&*self.db)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let store = store::Entity::find_by_id(product.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Store {} referenced by product {} is missing",
                    product.store_id, product.id
                ))
            })?;

        let detail = ProductDetail {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: unescape_html(&product.description),
            price: product.price,
            category: category.map(|c| NamedRef { id: c.id, name: c.name }),
            sub_category: sub_category.map(|s| SubCategoryRef {
                id: s.id,
                name: s.name,
                category: sub_category_parent.unwrap_or_default(),
            }),
            variant: variant.map(|v| VariantRef {
                id: v.id,
                name: v.name,
                sub_category: variant_parent.unwrap_or_default(),
            }),
            county,
            subcounty,
            town: product.town.clone(),
            store: StoreDetail {
                id: store.id,
                name: store.name,
                phone: store.phone_number,
                owner: OwnerRef {
                    id: store.owner_id,
                    username: store.owner_username,
                    email: store.owner_email,
                },
            },
            images,
            reviews,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        };

        self.cache
            .put_json(&cache_key, &detail, keys::PRODUCT_DETAIL_TTL)
            .await;

        Ok(Some(detail))
    }

    /// Record one view of an active product.
    #[instrument(skip(self))]
    pub async fn record_view(&self, id: Uuid) -> Result<(), ServiceError> {
        let exists = product::Entity::find_by_id(id)
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .one(&*self.db)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }

        let view = product_view::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(id),
            viewed_at: Set(Utc::now()),
        };
        view.insert(&*self.db).await?;

        self.event_sender.send_or_log(Event::ProductViewed(id)).await;
        Ok(())
    }

    /// Active products ranked by recorded views, descending.
    #[instrument(skip(self))]
    pub async fn top_viewed(&self, limit: Option<u64>) -> Result<TopViewedResult, ServiceError> {
        let limit = limit.unwrap_or(TOP_VIEWED_DEFAULT_LIMIT).max(1);

        let cache_key = keys::query_key(
            keys::TOP_VIEWED_KEY,
            &[("limit", limit.to_string())],
        );
        if let Some(cached) = self.cache.get_json(&cache_key).await {
            return Ok(cached);
        }

        let counts = view_counts(&self.db, limit).await?;
        let ranked_ids: Vec<Uuid> = counts.iter().map(|(id, _)| *id).collect();
        let count_by_id: HashMap<Uuid, i64> = counts.into_iter().collect();

        let mut products = if ranked_ids.is_empty() {
            Vec::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(ranked_ids.clone()))
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .all(&*self.db)
                .await?
        };

        // Restore the ranking lost by the id lookup
        let position: HashMap<Uuid, usize> = ranked_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();
        products.sort_by_key(|p| position.get(&p.id).copied().unwrap_or(usize::MAX));

        let maps = DisplayMaps::load(&self.db, &products, &self.media_base_url).await?;
        let items: Vec<TopViewedProduct> = products
            .iter()
            .map(|p| TopViewedProduct {
                summary: maps.build_summary(p),
                view_count: count_by_id.get(&p.id).copied().unwrap_or(0) as u64,
            })
            .collect();

        let result = TopViewedResult {
            total: items.len() as u64,
            items,
        };
        self.cache
            .put_json(&cache_key, &result, keys::TOP_VIEWED_TTL)
            .await;

        Ok(result)
    }
}

/// View counts per active product, highest first. `limit = 0` means all.
pub(crate) async fn view_counts(
    db: &DbPool,
    limit: u64,
) -> Result<Vec<(Uuid, i64)>, ServiceError> {
    let mut query = product_view::Entity::find()
        .select_only()
        .column(product_view::Column::ProductId)
        .column_as(product_view::Column::Id.count(), "view_count")
        .join(JoinType::InnerJoin, product_view::Relation::Product.def())
        .filter(product::Column::Status.eq(ProductStatus::Active))
        .group_by(product_view::Column::ProductId)
        .order_by_desc(Expr::col(Alias::new("view_count")));

    if limit > 0 {
        query = query.limit(limit);
    }

    query.into_tuple().all(db).await.map_err(Into::into)
}

/// Optional filter dimensions for product listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    pub county: Option<Uuid>,
    pub subcounty: Option<Uuid>,
    pub category: Option<Uuid>,
    pub sub_category: Option<Uuid>,
    pub variant: Option<Uuid>,
    pub search: Option<String>,
}

impl ProductFilters {
    fn cache_key(&self, page: u64, per_page: u64) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(id) = self.county {
            params.push(("county", id.to_string()));
        }
        if let Some(id) = self.subcounty {
            params.push(("subcounty", id.to_string()));
        }
        if let Some(id) = self.category {
            params.push(("category", id.to_string()));
        }
        if let Some(id) = self.sub_category {
            params.push(("sub_category", id.to_string()));
        }
        if let Some(id) = self.variant {
            params.push(("variant", id.to_string()));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("q", term.to_lowercase()));
        }
        keys::query_key("fetch_products", &params)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubCategoryRef {
    pub id: Uuid,
    pub name: String,
    /// Parent category name
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantRef {
    pub id: Uuid,
    pub name: String,
    /// Parent sub-category name
    pub sub_category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerRef {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreDetail {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub owner: OwnerRef,
}

/// Full product payload for the detail view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub category: Option<NamedRef>,
    pub sub_category: Option<SubCategoryRef>,
    pub variant: Option<VariantRef>,
    pub county: Option<String>,
    pub subcounty: Option<String>,
    pub town: Option<String>,
    pub store: StoreDetail,
    pub images: Vec<String>,
    pub reviews: Vec<ReviewItem>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewItem {
    pub id: Uuid,
    pub name: String,
    pub rating: i16,
    pub date: String,
    pub review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopViewedProduct {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub view_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopViewedResult {
    pub items: Vec<TopViewedProduct>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_cache_key_ignores_field_order() {
        let filters = ProductFilters {
            category: Some(Uuid::nil()),
            search: Some("maize".into()),
            ..Default::default()
        };
        // Key derivation sorts parameters, so two identical filter sets
        // always land on the same entry.
        assert_eq!(filters.cache_key(1, 10), filters.cache_key(1, 10));
    }

    #[test]
    fn filter_cache_key_distinguishes_pages() {
        let filters = ProductFilters::default();
        assert_ne!(filters.cache_key(1, 10), filters.cache_key(2, 10));
        assert_ne!(filters.cache_key(1, 10), filters.cache_key(1, 20));
    }

    #[test]
    fn blank_search_terms_do_not_affect_the_key() {
        let blank = ProductFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        let none = ProductFilters::default();
        assert_eq!(blank.cache_key(1, 10), none.cache_key(1, 10));
    }
}
