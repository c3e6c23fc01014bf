use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    routing::get,
};
use serde_json::json;

use crate::{response::MessageBody, state::AppState};

pub mod doc;
pub mod extract;
pub mod health;
pub mod products;

// The one route table: products under `/api/products`, plus health and docs.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/products", products::router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    let body = json!({ "message": "Not Found", "path": uri.path() });
    (StatusCode::NOT_FOUND, Json(body))
}

async fn method_not_allowed() -> (StatusCode, Json<MessageBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MessageBody::new("Method Not Allowed")),
    )
}
