use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppResult,
    models::Product,
    response::MessageBody,
    routes::extract::JsonOrForm,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 500, description = "Storage failure", body = MessageBody),
    ),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let items = product_service::list_products(&state).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = Product),
        (status = 404, description = "Product not found", body = MessageBody),
        (status = 500, description = "Storage failure or malformed id", body = MessageBody),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Product>> {
    let product = product_service::get_product(&state, &id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body(
        content = CreateProductRequest,
        content_type = "application/json",
        description = "Also accepted as application/x-www-form-urlencoded"
    ),
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation failed", body = MessageBody),
        (status = 500, description = "Storage failure", body = MessageBody),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = product_service::create_product(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 400, description = "Validation failed", body = MessageBody),
        (status = 404, description = "Product not found", body = MessageBody),
        (status = 500, description = "Storage failure or malformed id", body = MessageBody),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonOrForm(payload): JsonOrForm<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let product = product_service::update_product(&state, &id, payload).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product", body = Product),
        (status = 404, description = "Product not found", body = MessageBody),
        (status = 500, description = "Storage failure or malformed id", body = MessageBody),
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = product_service::delete_product(&state, &id).await?;
    Ok(Json(product))
}
