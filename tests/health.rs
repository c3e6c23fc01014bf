use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use product_catalog_api::{
    routes::{create_app, health::HealthData},
    state::AppState,
    storage::InMemoryProductStore,
};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = create_app(AppState::new(Arc::new(InMemoryProductStore::new())));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let data: HealthData = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(data.status, "ok");
    assert_eq!(data.storage, "up");
    assert_eq!(data.backend, "memory");
}
