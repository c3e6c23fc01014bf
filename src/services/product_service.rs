use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::{AppError, AppResult},
    models::Product,
    state::AppState,
};

pub async fn list_products(state: &AppState) -> AppResult<Vec<Product>> {
    let items = state.store.find_all().await?;
    Ok(items)
}

pub async fn get_product(state: &AppState, id: &str) -> AppResult<Product> {
    let result = state.store.find_by_id(id).await?;
    result.ok_or(AppError::NotFound)
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    let fields = payload.into_new_product()?;
    let product = state.store.insert(fields).await?;
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    id: &str,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    let changes = payload.into_changes()?;
    let result = state.store.update_by_id(id, changes).await?;
    result.ok_or(AppError::NotFound)
}

pub async fn delete_product(state: &AppState, id: &str) -> AppResult<Product> {
    let result = state.store.delete_by_id(id).await?;
    result.ok_or(AppError::NotFound)
}
