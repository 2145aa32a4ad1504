//! Deterministic cache key derivation and the per-query-type TTL table.
//!
//! List-style queries hash their full parameter set so that logically equal
//! requests share one entry regardless of parameter order; reference data
//! lives under fixed names so mutations can invalidate it directly.

use std::time::Duration;

use sha2::{Digest, Sha256};

/// Filtered/paginated product listings
pub const PRODUCT_LIST_TTL: Duration = Duration::from_secs(300);
/// Per-product detail payloads
pub const PRODUCT_DETAIL_TTL: Duration = Duration::from_secs(1800);
/// Top-viewed listing
pub const TOP_VIEWED_TTL: Duration = Duration::from_secs(900);
/// Composed home feed
pub const FEED_TTL: Duration = Duration::from_secs(300);
/// Category tree with product counts (also explicitly invalidated)
pub const CATEGORY_TREE_TTL: Duration = Duration::from_secs(3600);
/// Near-static geography and units reference data
pub const REFERENCE_TTL: Duration = Duration::from_secs(86_400);

/// Fixed key for the category tree; deleted on product create/edit because
/// those change per-category product counts.
pub const CATEGORY_TREE_KEY: &str = "categories_with_subcategories_variants";
pub const GEOGRAPHY_TREE_KEY: &str = "counties_with_subcounties";
pub const UNITS_KEY: &str = "units_of_measurement";
pub const TOP_VIEWED_KEY: &str = "top_viewed_products";

/// Derive a cache key from a query prefix and its parameter set. Pairs are
/// sorted by name before hashing, so the key is independent of the order in
/// which callers assemble them. Absent optional parameters must simply be
/// omitted; `(name, None)` and a missing pair hash identically.
pub fn query_key(prefix: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);

    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    for (name, value) in sorted {
        hasher.update(b"\x1f");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }

    format!("{}:{}", prefix, hex::encode(hasher.finalize()))
}

/// Key for one product's detail payload.
pub fn product_detail_key(id: uuid::Uuid) -> String {
    query_key("product_detail", &[("id", id.to_string())])
}
