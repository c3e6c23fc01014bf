use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProductStore;
use crate::error::{StorageError, StorageResult};
use crate::models::{NewProduct, Product, ProductChanges};

/// In-process store for development and tests. UUIDv7 keys keep listing in
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<BTreeMap<Uuid, Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_id(id: &str) -> StorageResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| StorageError::MalformedId {
            value: id.to_string(),
            expected: "UUID",
        })
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_all(&self) -> StorageResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let key = Self::parse_id(id)?;
        let products = self.products.read().await;
        Ok(products.get(&key).cloned())
    }

    async fn insert(&self, fields: NewProduct) -> StorageResult<Product> {
        let key = Uuid::now_v7();
        let now = Utc::now();
        let product = Product {
            id: key.to_string(),
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            img: fields.img,
            created_at: now,
            updated_at: now,
        };

        self.products.write().await.insert(key, product.clone());
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    async fn update_by_id(
        &self,
        id: &str,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>> {
        let key = Self::parse_id(id)?;
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&key) else {
            return Ok(None);
        };

        changes.apply_to(product, Utc::now());
        tracing::info!(product_id = %id, "product updated");
        Ok(Some(product.clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let key = Self::parse_id(id)?;
        let removed = self.products.write().await.remove(&key);
        if removed.is_some() {
            tracing::info!(product_id = %id, "product deleted");
        }
        Ok(removed)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
