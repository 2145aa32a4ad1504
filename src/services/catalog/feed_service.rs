use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::{keys, CacheBackend};
use crate::db::DbPool;
use crate::entities::{ad, ad_payment, product, AdPaidStatus, AdStatus, ProductStatus};
use crate::errors::ServiceError;
use crate::services::catalog::common::{CatalogCache, DisplayMaps, ProductSummary};
use crate::services::catalog::product_query_service::view_counts;

/// Per-tier caps for the home feed. Each cap is an upper bound on its own
/// tier; a short tier is never backfilled from the others.
#[derive(Debug, Clone, Copy)]
pub struct FeedTierLimits {
    pub boost: u64,
    pub most_viewed: u64,
    pub other: u64,
}

/// Composes the storefront home feed: a ranked union of three mutually
/// exclusive tiers — boosted (paid ads), most-viewed, and newest — merged
/// in that fixed priority order, deduplicated by first appearance, and
/// paginated in memory.
#[derive(Clone)]
pub struct FeedService {
    db: Arc<DbPool>,
    cache: CatalogCache,
    media_base_url: String,
}

impl FeedService {
    pub fn new(db: Arc<DbPool>, cache: Arc<dyn CacheBackend>, media_base_url: String) -> Self {
        Self {
            db,
            cache: CatalogCache::new(cache),
            media_base_url,
        }
    }

    #[instrument(skip(self))]
    pub async fn compose_feed(
        &self,
        page: u64,
        per_page: u64,
        limits: FeedTierLimits,
    ) -> Result<FeedPage, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let cache_key = keys::query_key(
            "list_all_products",
            &[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("boost_limit", limits.boost.to_string()),
                ("most_viewed_limit", limits.most_viewed.to_string()),
                ("other_limit", limits.other.to_string()),
            ],
        );
        if let Some(cached) = self.cache.get_json(&cache_key).await {
            return Ok(cached);
        }

        // Tier 1: boosted — active products with an active, fully paid ad,
        // ranked by the total paid across those ads' payments.
        let boost_totals = self.boost_totals().await?;
        let mut boosted: Vec<product::Model> = if boost_totals.is_empty() || limits.boost == 0 {
            Vec::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(boost_totals.keys().copied().collect::<Vec<_>>()))
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .all(&*self.db)
                .await?
        };
        boosted.sort_by(|a, b| {
            let amount_a = boost_totals.get(&a.id).copied().unwrap_or(Decimal::ZERO);
            let amount_b = boost_totals.get(&b.id).copied().unwrap_or(Decimal::ZERO);
            amount_b.cmp(&amount_a)
        });
        boosted.truncate(limits.boost as usize);
        let boosted_ids: HashSet<Uuid> = boosted.iter().map(|p| p.id).collect();

        // Tier 2: most viewed, excluding anything already boosted. The
        // count query over-fetches by the boosted tier size so exclusions
        // cannot starve the tier.
        let fetch_limit = limits
            .most_viewed
            .saturating_add(boosted_ids.len() as u64);
        let counts = if limits.most_viewed == 0 {
            Vec::new()
        } else {
            view_counts(&self.db, fetch_limit).await?
        };
        let count_by_id: HashMap<Uuid, i64> = counts.iter().copied().collect();
        let viewed_ids: Vec<Uuid> = counts
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !boosted_ids.contains(id))
            .take(limits.most_viewed as usize)
            .collect();

        let mut most_viewed: Vec<product::Model> = if viewed_ids.is_empty() {
            Vec::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(viewed_ids.clone()))
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .all(&*self.db)
                .await?
        };
        let rank: HashMap<Uuid, usize> = viewed_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();
        most_viewed.sort_by_key(|p| rank.get(&p.id).copied().unwrap_or(usize::MAX));

        // Tier 3: everything else, newest first.
        let mut excluded: Vec<Uuid> = boosted_ids.iter().copied().collect();
        excluded.extend(most_viewed.iter().map(|p| p.id));
        let other: Vec<product::Model> = if limits.other == 0 {
            Vec::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .filter(product::Column::Id.is_not_in(excluded))
                .order_by_desc(product::Column::CreatedAt)
                .limit(limits.other)
                .all(&*self.db)
                .await?
        };

        let boosted_count = boosted.len() as u64;
        let most_viewed_count = most_viewed.len() as u64;
        let other_count = other.len() as u64;

        let merged = merge_by_first_seen(vec![boosted, most_viewed, other], |p| p.id);
        let total = merged.len() as u64;

        let page_items = page_slice(&merged, page, per_page);
        let maps = DisplayMaps::load(&self.db, &page_items, &self.media_base_url).await?;

        let items: Vec<FeedProduct> = page_items
            .iter()
            .map(|p| {
                let boost_amount = boost_totals.get(&p.id).copied();
                FeedProduct {
                    summary: maps.build_summary(p),
                    view_count: count_by_id.get(&p.id).copied().unwrap_or(0) as u64,
                    is_boosted: boosted_ids.contains(&p.id),
                    boost_amount: if boosted_ids.contains(&p.id) {
                        boost_amount.unwrap_or(Decimal::ZERO)
                    } else {
                        Decimal::ZERO
                    },
                }
            })
            .collect();

        let result = FeedPage {
            has_next: page.saturating_mul(per_page) < total,
            has_previous: page > 1,
            items,
            total,
            page,
            per_page,
            boosted_count,
            most_viewed_count,
            other_count,
        };

        self.cache.put_json(&cache_key, &result, keys::FEED_TTL).await;

        Ok(result)
    }

    /// Total paid amount per boosted product: sum of payments across its
    /// ads with status Active and paid_status Paid.
    async fn boost_totals(&self) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let ads = ad::Entity::find()
            .filter(ad::Column::Status.eq(AdStatus::Active))
            .filter(ad::Column::PaidStatus.eq(AdPaidStatus::Paid))
            .all(&*self.db)
            .await?;

        if ads.is_empty() {
            return Ok(HashMap::new());
        }

        let product_by_ad: HashMap<Uuid, Uuid> =
            ads.iter().map(|a| (a.id, a.product_id)).collect();

        let payments = ad_payment::Entity::find()
            .filter(ad_payment::Column::AdId.is_in(product_by_ad.keys().copied().collect::<Vec<_>>()))
            .all(&*self.db)
            .await?;

        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        // Qualifying products with no settled payments still rank, at zero.
        for product_id in product_by_ad.values() {
            totals.entry(*product_id).or_insert(Decimal::ZERO);
        }
        for payment in payments {
            if let Some(product_id) = product_by_ad.get(&payment.ad_id) {
                *totals.entry(*product_id).or_insert(Decimal::ZERO) += payment.amount;
            }
        }

        Ok(totals)
    }
}

/// Concatenate tiers in priority order, keeping only the first occurrence
/// of each id. Guarantees tier-1 entries outrank later tiers and that no
/// product appears twice even when it qualifies for several tiers.
pub(crate) fn merge_by_first_seen<T>(
    tiers: Vec<Vec<T>>,
    id_of: impl Fn(&T) -> Uuid,
) -> Vec<T> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut merged = Vec::new();

    for tier in tiers {
        for item in tier {
            if seen.insert(id_of(&item)) {
                merged.push(item);
            }
        }
    }

    merged
}

/// Offset pagination over the in-memory merged list. A page past the end
/// is an empty slice, not an error.
pub(crate) fn page_slice<T: Clone>(items: &[T], page: u64, per_page: u64) -> Vec<T> {
    let start = (page.saturating_sub(1)).saturating_mul(per_page) as usize;
    if start >= items.len() {
        return Vec::new();
    }
    let end = (start + per_page as usize).min(items.len());
    items[start..end].to_vec()
}

/// One feed entry: a product summary plus ranking metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedProduct {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub view_count: u64,
    pub is_boosted: bool,
    pub boost_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedPage {
    pub items: Vec<FeedProduct>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub boosted_count: u64,
    pub most_viewed_count: u64,
    pub other_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn merge_keeps_tier_priority() {
        let [a, b, c] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let merged = merge_by_first_seen(vec![vec![a], vec![b], vec![c]], |id| *id);
        assert_eq!(merged, vec![a, b, c]);
    }

    #[test]
    fn merge_dedups_by_first_seen() {
        let [a, b] = [Uuid::new_v4(), Uuid::new_v4()];
        // `a` qualifies for both tiers; it must appear once, in tier-1
        // position, ahead of the heavily-viewed `b`.
        let merged = merge_by_first_seen(vec![vec![a], vec![b, a]], |id| *id);
        assert_eq!(merged, vec![a, b]);
    }

    #[test]
    fn merge_tolerates_empty_tiers() {
        let [a, b] = [Uuid::new_v4(), Uuid::new_v4()];
        let merged = merge_by_first_seen(vec![vec![], vec![a], vec![], vec![b]], |id| *id);
        assert_eq!(merged, vec![a, b]);
    }

    #[test]
    fn page_slice_basics() {
        let items = ids(5);
        assert_eq!(page_slice(&items, 1, 2), items[0..2].to_vec());
        assert_eq!(page_slice(&items, 2, 2), items[2..4].to_vec());
        assert_eq!(page_slice(&items, 3, 2), items[4..5].to_vec());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items = ids(3);
        assert!(page_slice(&items, 5, 2).is_empty());
        assert!(page_slice::<Uuid>(&[], 1, 10).is_empty());
    }
}
