//! Shared building blocks for the catalog services: paged results, product
//! summaries, image URL resolution, and the best-effort cache wrapper.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::entities::{
    category, county, product, product_image, store, sub_category, sub_county, variant,
    StoreModel,
};
use crate::errors::ServiceError;

/// Descriptions are capped at this many characters in list views
pub const SUMMARY_DESCRIPTION_CHARS: usize = 300;

/// Offset-paginated result envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let has_next = page.saturating_mul(per_page) < total;
        let has_previous = page > 1;
        Self {
            items,
            total,
            page,
            per_page,
            has_next,
            has_previous,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreRef {
    pub id: Uuid,
    pub name: String,
}

/// Product as it appears in list views and the home feed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub store: StoreRef,
    pub category: String,
    pub sub_category: Option<String>,
    pub variant: Option<String>,
    /// Primary image (first by sort order), already URL-resolved
    pub image: Option<String>,
    pub images: Vec<String>,
    pub county: Option<String>,
    pub subcounty: Option<String>,
    pub town: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Resolve a stored image reference to a servable URL. Absolute http/https
/// references pass through unchanged; anything else is prefixed with the
/// serving domain. Applied uniformly everywhere an image reference surfaces.
pub fn resolve_image_url(reference: &str, media_base_url: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    let base = media_base_url.trim_end_matches('/');
    if reference.starts_with('/') {
        format!("{}{}", base, reference)
    } else {
        format!("{}/{}", base, reference)
    }
}

/// Cap a description at `max_chars` characters, appending an ellipsis only
/// when something was cut. Operates on chars, never on raw bytes, so a
/// multi-byte character is never split.
pub fn truncate_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }
    let mut truncated: String = description.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// Undo the HTML entity escaping that descriptions acquire on ingestion.
pub fn unescape_html(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Display data joined onto a page of products: reference names, store
/// records, and resolved image URLs, each loaded with one query and keyed
/// by id.
pub struct DisplayMaps {
    pub categories: HashMap<Uuid, String>,
    pub sub_categories: HashMap<Uuid, String>,
    pub variants: HashMap<Uuid, String>,
    pub counties: HashMap<Uuid, String>,
    pub sub_counties: HashMap<Uuid, String>,
    pub stores: HashMap<Uuid, StoreModel>,
    pub images: HashMap<Uuid, Vec<String>>,
}

impl DisplayMaps {
    pub async fn load(
        db: &DatabaseConnection,
        products: &[product::Model],
        media_base_url: &str,
    ) -> Result<Self, ServiceError> {
        let mut category_ids = HashSet::new();
        let mut sub_category_ids = HashSet::new();
        let mut variant_ids = HashSet::new();
        let mut county_ids = HashSet::new();
        let mut sub_county_ids = HashSet::new();
        let mut store_ids = HashSet::new();
        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        for p in products {
            category_ids.insert(p.category_id);
            store_ids.insert(p.store_id);
            if let Some(id) = p.sub_category_id {
                sub_category_ids.insert(id);
            }
            if let Some(id) = p.variant_id {
                variant_ids.insert(id);
            }
            if let Some(id) = p.county_id {
                county_ids.insert(id);
            }
            if let Some(id) = p.subcounty_id {
                sub_county_ids.insert(id);
            }
        }

        let categories = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        let sub_categories = if sub_category_ids.is_empty() {
            HashMap::new()
        } else {
            sub_category::Entity::find()
                .filter(sub_category::Column::Id.is_in(sub_category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        let variants = if variant_ids.is_empty() {
            HashMap::new()
        } else {
            variant::Entity::find()
                .filter(variant::Column::Id.is_in(variant_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect()
        };

        let counties = if county_ids.is_empty() {
            HashMap::new()
        } else {
            county::Entity::find()
                .filter(county::Column::Id.is_in(county_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        let sub_counties = if sub_county_ids.is_empty() {
            HashMap::new()
        } else {
            sub_county::Entity::find()
                .filter(sub_county::Column::Id.is_in(sub_county_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        let stores = if store_ids.is_empty() {
            HashMap::new()
        } else {
            store::Entity::find()
                .filter(store::Column::Id.is_in(store_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let mut images: HashMap<Uuid, Vec<String>> = HashMap::new();
        if !product_ids.is_empty() {
            let rows = product_image::Entity::find()
                .filter(product_image::Column::ProductId.is_in(product_ids))
                .order_by_asc(product_image::Column::SortOrder)
                .all(db)
                .await?;

            for image in rows {
                images
                    .entry(image.product_id)
                    .or_default()
                    .push(resolve_image_url(&image.url, media_base_url));
            }
        }

        Ok(Self {
            categories,
            sub_categories,
            variants,
            counties,
            sub_counties,
            stores,
            images,
        })
    }

    pub fn build_summary(&self, product: &product::Model) -> ProductSummary {
        let images = self.images.get(&product.id).cloned().unwrap_or_default();
        let store = self
            .stores
            .get(&product.store_id)
            .map(|s| StoreRef {
                id: s.id,
                name: s.name.clone(),
            })
            .unwrap_or(StoreRef {
                id: product.store_id,
                name: String::new(),
            });

        ProductSummary {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: truncate_description(&product.description, SUMMARY_DESCRIPTION_CHARS),
            price: product.price,
            store,
            category: self
                .categories
                .get(&product.category_id)
                .cloned()
                .unwrap_or_default(),
            sub_category: product
                .sub_category_id
                .and_then(|id| self.sub_categories.get(&id).cloned()),
            variant: product
                .variant_id
                .and_then(|id| self.variants.get(&id).cloned()),
            image: images.first().cloned(),
            images,
            county: product
                .county_id
                .and_then(|id| self.counties.get(&id).cloned()),
            subcounty: product
                .subcounty_id
                .and_then(|id| self.sub_counties.get(&id).cloned()),
            town: product.town.clone(),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

/// Best-effort view over the cache backend. Every failure — backend errors
/// and undecodable payloads alike — degrades to a miss with a warning; a
/// broken cache must never fail a catalog request.
#[derive(Clone)]
pub struct CatalogCache {
    backend: Arc<dyn CacheBackend>,
}

impl CatalogCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, "Failed to decode cached payload: {}", err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key, "Cache read failed, falling through to live query: {}", err);
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, "Failed to serialize payload for caching: {}", err);
                return;
            }
        };
        if let Err(err) = self.backend.set(key, &raw, Some(ttl)).await {
            warn!(key, "Cache write failed: {}", err);
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(err) = self.backend.delete(key).await {
            warn!(key, "Cache invalidation failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_image_urls_pass_through() {
        assert_eq!(
            resolve_image_url("https://cdn.x/img.jpg", "https://api.x"),
            "https://cdn.x/img.jpg"
        );
        assert_eq!(
            resolve_image_url("http://cdn.x/img.jpg", "https://api.x"),
            "http://cdn.x/img.jpg"
        );
    }

    #[test]
    fn relative_image_refs_get_the_serving_domain() {
        assert_eq!(
            resolve_image_url("/media/img.jpg", "https://api.x"),
            "https://api.x/media/img.jpg"
        );
        assert_eq!(
            resolve_image_url("media/img.jpg", "https://api.x/"),
            "https://api.x/media/img.jpg"
        );
    }

    #[test]
    fn short_descriptions_are_untouched() {
        let text = "short description";
        assert_eq!(truncate_description(text, 300), text);
    }

    #[test]
    fn exact_limit_is_untouched() {
        let text: String = std::iter::repeat('a').take(300).collect();
        assert_eq!(truncate_description(&text, 300), text);
    }

    #[test]
    fn long_descriptions_are_capped_with_ellipsis() {
        let text: String = std::iter::repeat('a').take(400).collect();
        let truncated = truncate_description(&text, 300);
        assert_eq!(truncated.chars().count(), 303);
        assert!(truncated.ends_with("..."));
        assert!(text.starts_with(truncated.trim_end_matches("...")));
    }

    #[test]
    fn truncation_never_splits_multibyte_chars() {
        let text: String = std::iter::repeat('ß').take(400).collect();
        let truncated = truncate_description(&text, 300);
        assert_eq!(truncated.chars().count(), 303);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn unescape_handles_standard_entities() {
        assert_eq!(
            unescape_html("Tom &amp; Jerry &lt;3 &quot;cheese&quot;"),
            "Tom & Jerry <3 \"cheese\""
        );
        assert_eq!(unescape_html("no entities"), "no entities");
    }

    #[test]
    fn paged_result_flags() {
        let first: PagedResult<u8> = PagedResult::new(vec![1, 2], 5, 1, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let last: PagedResult<u8> = PagedResult::new(vec![5], 5, 3, 2);
        assert!(!last.has_next);
        assert!(last.has_previous);

        let beyond: PagedResult<u8> = PagedResult::new(vec![], 5, 9, 2);
        assert!(!beyond.has_next);
        assert!(beyond.has_previous);
    }
}
