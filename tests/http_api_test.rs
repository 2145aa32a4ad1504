mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{ProductSpec, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn router(app: &TestApp) -> Router {
    Router::new()
        .nest("/api/v1", soko_api::api_v1_routes())
        .with_state(app.state.clone())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn product_listing_is_served_over_http() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Electronics").await;
    let store = app.seed_store("Duka", Uuid::new_v4()).await;
    app.seed_product(ProductSpec::new("Radio", cat.id, store.id))
        .await;

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Radio");
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn unknown_product_detail_is_a_404_payload() {
    let app = TestApp::new().await;

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/products/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn mutations_require_an_authenticated_principal() {
    let app = TestApp::new().await;
    let cat = app.seed_category("Fashion").await;
    let owner = Uuid::new_v4();
    let store = app.seed_store("Viatu", owner).await;

    let payload = json!({
        "name": "Blue Shoes",
        "price": "19.99",
        "category_id": cat.id,
        "store_id": store.id,
    });

    // No X-User-Id header: rejected before reaching the service
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/products")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With the gateway-supplied principal it goes through
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/products")
                .header("content-type", "application/json")
                .header("x-user-id", owner.to_string())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["slug"], "blue-shoes");
}

#[tokio::test]
async fn feed_and_reference_endpoints_respond() {
    let app = TestApp::new().await;
    app.seed_county("Nairobi").await;

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/feed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/counties")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "Nairobi");
}

#[tokio::test]
async fn health_reports_dependency_status() {
    let app = TestApp::new().await;

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["cache"], "healthy");
}
