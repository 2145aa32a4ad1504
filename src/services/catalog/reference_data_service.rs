use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::{keys, CacheBackend};
use crate::db::DbPool;
use crate::entities::{
    category, county, product, product_view, sub_category, sub_county, unit_of_measurement,
    variant, ProductStatus,
};
use crate::errors::ServiceError;
use crate::services::catalog::common::CatalogCache;

/// Reference-data reads: the category hierarchy (with per-category product
/// counts and view totals), the geography tree, and measurement units. Each
/// is cached whole; geography and units are near-static and expire by TTL
/// only, while the category tree is also invalidated on product mutations.
#[derive(Clone)]
pub struct ReferenceDataService {
    db: Arc<DbPool>,
    cache: CatalogCache,
}

impl ReferenceDataService {
    pub fn new(db: Arc<DbPool>, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            db,
            cache: CatalogCache::new(cache),
        }
    }

    /// Categories with nested sub-categories and variants plus computed
    /// product counts and view totals.
    #[instrument(skip(self))]
    pub async fn category_tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        if let Some(cached) = self.cache.get_json(keys::CATEGORY_TREE_KEY).await {
            return Ok(cached);
        }

        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        let sub_categories = sub_category::Entity::find()
            .order_by_asc(sub_category::Column::Name)
            .all(&*self.db)
            .await?;
        let variants = variant::Entity::find()
            .order_by_asc(variant::Column::Name)
            .all(&*self.db)
            .await?;

        let product_counts: HashMap<Uuid, i64> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "product_count")
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Uuid, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .collect();

        let view_totals: HashMap<Uuid, i64> = product_view::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product_view::Column::Id.count(), "view_count")
            .join(JoinType::InnerJoin, product_view::Relation::Product.def())
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Uuid, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .collect();

        let mut variants_by_sub: HashMap<Uuid, Vec<VariantNode>> = HashMap::new();
        for v in variants {
            variants_by_sub
                .entry(v.sub_category_id)
                .or_default()
                .push(VariantNode { id: v.id, name: v.name });
        }

        let mut subs_by_category: HashMap<Uuid, Vec<SubCategoryNode>> = HashMap::new();
        for s in sub_categories {
            let variants = variants_by_sub.remove(&s.id).unwrap_or_default();
            subs_by_category
                .entry(s.category_id)
                .or_default()
                .push(SubCategoryNode {
                    id: s.id,
                    name: s.name,
                    variants,
                });
        }

        let tree: Vec<CategoryNode> = categories
            .into_iter()
            .map(|c| CategoryNode {
                total_products: product_counts.get(&c.id).copied().unwrap_or(0) as u64,
                total_views: view_totals.get(&c.id).copied().unwrap_or(0) as u64,
                sub_categories: subs_by_category.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
                slug: c.slug,
            })
            .collect();

        self.cache
            .put_json(keys::CATEGORY_TREE_KEY, &tree, keys::CATEGORY_TREE_TTL)
            .await;

        Ok(tree)
    }

    /// Counties with nested sub-counties.
    #[instrument(skip(self))]
    pub async fn geography_tree(&self) -> Result<Vec<CountyNode>, ServiceError> {
        if let Some(cached) = self.cache.get_json(keys::GEOGRAPHY_TREE_KEY).await {
            return Ok(cached);
        }

        let counties = county::Entity::find()
            .order_by_asc(county::Column::Name)
            .all(&*self.db)
            .await?;
        let sub_counties = sub_county::Entity::find()
            .order_by_asc(sub_county::Column::Name)
            .all(&*self.db)
            .await?;

        let mut subs_by_county: HashMap<Uuid, Vec<SubCountyNode>> = HashMap::new();
        for s in sub_counties {
            subs_by_county
                .entry(s.county_id)
                .or_default()
                .push(SubCountyNode { id: s.id, name: s.name });
        }

        let tree: Vec<CountyNode> = counties
            .into_iter()
            .map(|c| CountyNode {
                sub_counties: subs_by_county.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
            })
            .collect();

        self.cache
            .put_json(keys::GEOGRAPHY_TREE_KEY, &tree, keys::REFERENCE_TTL)
            .await;

        Ok(tree)
    }

    /// Units of measurement.
    #[instrument(skip(self))]
    pub async fn units_of_measurement(&self) -> Result<Vec<UnitItem>, ServiceError> {
        if let Some(cached) = self.cache.get_json(keys::UNITS_KEY).await {
            return Ok(cached);
        }

        let units: Vec<UnitItem> = unit_of_measurement::Entity::find()
            .order_by_asc(unit_of_measurement::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|u| UnitItem {
                id: u.id,
                name: u.name,
                abbreviation: u.abbreviation,
            })
            .collect();

        self.cache
            .put_json(keys::UNITS_KEY, &units, keys::REFERENCE_TTL)
            .await;

        Ok(units)
    }

    /// Drop the cached category tree. Called after any product mutation
    /// that changes per-category product counts.
    pub async fn invalidate_category_tree(&self) {
        self.cache.delete(keys::CATEGORY_TREE_KEY).await;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantNode {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubCategoryNode {
    pub id: Uuid,
    pub name: String,
    pub variants: Vec<VariantNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub total_products: u64,
    pub total_views: u64,
    pub sub_categories: Vec<SubCategoryNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubCountyNode {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountyNode {
    pub id: Uuid,
    pub name: String,
    pub sub_counties: Vec<SubCountyNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnitItem {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
}
