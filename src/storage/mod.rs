//! Storage gateway for products.
//!
//! Every backend implements [`ProductStore`]; the rest of the crate only sees
//! `Arc<dyn ProductStore>`, chosen at startup from the connection string.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{NewProduct, Product, ProductChanges};

pub mod memory;
pub mod mongo;
pub mod postgres;

pub use memory::InMemoryProductStore;
pub use mongo::MongoProductStore;
pub use postgres::PgProductStore;

/// Persistence operations for products. Ids are opaque strings; each backend
/// rejects ids that do not parse as its own identifier format with
/// [`StorageError::MalformedId`](crate::error::StorageError::MalformedId).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products. Empty store yields an empty vector.
    async fn find_all(&self) -> StorageResult<Vec<Product>>;

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>>;

    /// Assigns the id and both timestamps.
    async fn insert(&self, fields: NewProduct) -> StorageResult<Product>;

    /// Returns the record as it is after the update.
    async fn update_by_id(
        &self,
        id: &str,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>>;

    /// Returns the removed record.
    async fn delete_by_id(&self, id: &str) -> StorageResult<Option<Product>>;

    async fn ping(&self) -> StorageResult<()>;

    fn backend(&self) -> &'static str;
}
