mod common;

use common::{ProductSpec, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use soko_api::services::catalog::FeedTierLimits;

fn limits(boost: u64, most_viewed: u64, other: u64) -> FeedTierLimits {
    FeedTierLimits {
        boost,
        most_viewed,
        other,
    }
}

#[tokio::test]
async fn boosted_products_rank_before_heavily_viewed_ones() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Electronics").await;
    let store = app.seed_store("Duka Moja", Uuid::new_v4()).await;

    // A: boosted with a modest payment, barely viewed
    let a = app
        .seed_product(ProductSpec::new("Boosted Radio", cat.id, store.id))
        .await;
    app.seed_paid_ad(a.id, &[dec!(10)]).await;

    // B: no ad, but far more views
    let b = app
        .seed_product(ProductSpec::new("Viral Phone", cat.id, store.id))
        .await;
    app.seed_views(b.id, 20).await;

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(1, 1, 10))
        .await
        .unwrap();

    let ids: Vec<Uuid> = feed.items.iter().map(|i| i.summary.id).collect();
    let pos_a = ids.iter().position(|id| *id == a.id).unwrap();
    let pos_b = ids.iter().position(|id| *id == b.id).unwrap();
    assert!(pos_a < pos_b, "boosted product must precede most-viewed");

    // Each appears exactly once
    assert_eq!(ids.iter().filter(|id| **id == a.id).count(), 1);
    assert_eq!(ids.iter().filter(|id| **id == b.id).count(), 1);

    assert!(feed.items[pos_a].is_boosted);
    assert_eq!(feed.items[pos_a].boost_amount, dec!(10));
    assert!(!feed.items[pos_b].is_boosted);
    assert_eq!(feed.items[pos_b].boost_amount, Decimal::ZERO);
    assert_eq!(feed.items[pos_b].view_count, 20);
}

#[tokio::test]
async fn boosted_tier_ranks_by_total_paid() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Fashion").await;
    let store = app.seed_store("Duka Mbili", Uuid::new_v4()).await;

    let small = app
        .seed_product(ProductSpec::new("Small Spender", cat.id, store.id))
        .await;
    app.seed_paid_ad(small.id, &[dec!(30)]).await;

    // Payments sum across an ad's payment records
    let big = app
        .seed_product(ProductSpec::new("Big Spender", cat.id, store.id))
        .await;
    app.seed_paid_ad(big.id, &[dec!(20), dec!(35)])
        .await;

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(10, 10, 10))
        .await
        .unwrap();

    assert_eq!(feed.items[0].summary.id, big.id);
    assert_eq!(feed.items[0].boost_amount, dec!(55));
    assert_eq!(feed.items[1].summary.id, small.id);
    assert_eq!(feed.boosted_count, 2);
}

#[tokio::test]
async fn tier_shortfalls_are_not_backfilled() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Farming").await;
    let store = app.seed_store("Shamba", Uuid::new_v4()).await;

    // One boosted product against a boost cap of 5: the tier stays at 1
    let boosted = app
        .seed_product(ProductSpec::new("Boosted Jembe", cat.id, store.id))
        .await;
    app.seed_paid_ad(boosted.id, &[dec!(10)]).await;

    for i in 0..4 {
        app.seed_product(ProductSpec::new(&format!("Filler {}", i), cat.id, store.id).aged(i))
            .await;
    }

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 20, limits(5, 5, 20))
        .await
        .unwrap();

    assert_eq!(feed.boosted_count, 1);
    assert_eq!(feed.most_viewed_count, 0);
    assert_eq!(feed.other_count, 4);
    assert_eq!(feed.total, 5);
}

#[tokio::test]
async fn products_qualifying_for_multiple_tiers_appear_once() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Electronics").await;
    let store = app.seed_store("Duka Tatu", Uuid::new_v4()).await;

    // Boosted AND the most viewed product in the catalog
    let double = app
        .seed_product(ProductSpec::new("Double Qualifier", cat.id, store.id))
        .await;
    app.seed_paid_ad(double.id, &[dec!(50)]).await;
    app.seed_views(double.id, 15).await;

    let runner_up = app
        .seed_product(ProductSpec::new("Runner Up", cat.id, store.id))
        .await;
    app.seed_views(runner_up.id, 5).await;

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(5, 5, 5))
        .await
        .unwrap();

    let ids: Vec<Uuid> = feed.items.iter().map(|i| i.summary.id).collect();
    assert_eq!(ids.iter().filter(|id| **id == double.id).count(), 1);
    assert_eq!(ids[0], double.id);
    assert!(feed.items[0].is_boosted);

    // The most-viewed tier holds the runner-up, not the boosted product
    assert_eq!(feed.most_viewed_count, 1);
    assert_eq!(ids[1], runner_up.id);
}

#[tokio::test]
async fn feed_is_idempotent_within_the_cache_ttl() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Books").await;
    let store = app.seed_store("Vitabu", Uuid::new_v4()).await;

    app.seed_product(ProductSpec::new("Novel", cat.id, store.id))
        .await;

    let first = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(3, 3, 10))
        .await
        .unwrap();

    // Mutating the catalog underneath does not change the cached feed
    app.seed_product(ProductSpec::new("Textbook", cat.id, store.id))
        .await;

    let second = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(3, 3, 10))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    // Different parameters are a different cache entry and see the new row
    let other_params = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(3, 3, 11))
        .await
        .unwrap();
    assert_eq!(other_params.total, 2);
}

#[tokio::test]
async fn merged_feed_paginates_in_memory() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Farming").await;
    let store = app.seed_store("Shamba Kuu", Uuid::new_v4()).await;

    for i in 0..5 {
        app.seed_product(ProductSpec::new(&format!("Produce {}", i), cat.id, store.id).aged(i))
            .await;
    }

    let page1 = app
        .state
        .services
        .feed
        .compose_feed(1, 2, limits(3, 3, 10))
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.total, 5);
    assert!(page1.has_next);
    assert!(!page1.has_previous);

    let page3 = app
        .state
        .services
        .feed
        .compose_feed(3, 2, limits(3, 3, 10))
        .await
        .unwrap();
    assert_eq!(page3.items.len(), 1);
    assert!(!page3.has_next);
    assert!(page3.has_previous);

    let beyond = app
        .state
        .services
        .feed
        .compose_feed(9, 2, limits(3, 3, 10))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert!(!beyond.has_next);
}

#[tokio::test]
async fn deactivated_and_unpaid_products_never_enter_the_feed() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Electronics").await;
    let store = app.seed_store("Duka Nne", Uuid::new_v4()).await;

    // Deactivated product with a paid ad: excluded entirely
    let hidden = app
        .seed_product(ProductSpec::new("Hidden", cat.id, store.id).deactivated())
        .await;
    app.seed_paid_ad(hidden.id, &[dec!(100)]).await;

    // Active product whose ad was never paid: listed, but not boosted
    let unpaid = app
        .seed_product(ProductSpec::new("Unpaid", cat.id, store.id))
        .await;
    app.seed_unpaid_ad(unpaid.id).await;

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(5, 5, 10))
        .await
        .unwrap();

    let ids: Vec<Uuid> = feed.items.iter().map(|i| i.summary.id).collect();
    assert!(!ids.contains(&hidden.id));
    assert!(ids.contains(&unpaid.id));
    assert_eq!(feed.boosted_count, 0);

    let unpaid_item = feed
        .items
        .iter()
        .find(|i| i.summary.id == unpaid.id)
        .unwrap();
    assert!(!unpaid_item.is_boosted);
    assert_eq!(unpaid_item.boost_amount, Decimal::ZERO);
}

#[tokio::test]
async fn empty_catalog_produces_an_empty_feed() {
    let app = TestApp::new().await;

    let feed = app
        .state
        .services
        .feed
        .compose_feed(1, 10, limits(5, 5, 5))
        .await
        .unwrap();

    assert!(feed.items.is_empty());
    assert_eq!(feed.total, 0);
    assert!(!feed.has_next);
    assert_eq!(feed.boosted_count, 0);
    assert_eq!(feed.most_viewed_count, 0);
    assert_eq!(feed.other_count, 0);
}
