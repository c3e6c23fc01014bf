//! PostgreSQL implementation of ProductStore, on SeaORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder};
use tokio::sync::OnceCell;
use tracing::instrument;
use uuid::Uuid;

use super::ProductStore;
use crate::db::ensure_schema;
use crate::entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel};
use crate::error::{StorageError, StorageResult};
use crate::models::{NewProduct, Product, ProductChanges};

pub struct PgProductStore {
    conn: DatabaseConnection,
    schema: OnceCell<()>,
}

impl PgProductStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            schema: OnceCell::new(),
        }
    }

    /// The connection, once the `products` table is known to exist. A failed
    /// attempt is retried on the next call.
    async fn ready(&self) -> StorageResult<&DatabaseConnection> {
        self.schema
            .get_or_try_init(|| ensure_schema(&self.conn))
            .await?;
        Ok(&self.conn)
    }

    fn parse_id(id: &str) -> StorageResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| StorageError::MalformedId {
            value: id.to_string(),
            expected: "UUID",
        })
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id.to_string(),
        name: model.name,
        quantity: model.quantity,
        price: model.price,
        img: model.img,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn active_changes(
    existing: ProductModel,
    changes: ProductChanges,
    now: DateTime<Utc>,
) -> ActiveModel {
    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(quantity) = changes.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(img) = changes.img {
        active.img = Set(Some(img));
    }
    active.updated_at = Set(now.fixed_offset());
    active
}

/// A row deleted between the read and the update is reported as absent.
fn updated_or_missing(result: Result<ProductModel, DbErr>) -> StorageResult<Option<ProductModel>> {
    match result {
        Ok(model) => Ok(Some(model)),
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[instrument(skip(self))]
    async fn find_all(&self) -> StorageResult<Vec<Product>> {
        let conn = self.ready().await?;
        let items = Products::find()
            .order_by_asc(Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let id = Self::parse_id(id)?;
        let conn = self.ready().await?;
        let found = Products::find_by_id(id).one(conn).await?;
        Ok(found.map(product_from_entity))
    }

    #[instrument(skip(self, fields), fields(product_name = %fields.name))]
    async fn insert(&self, fields: NewProduct) -> StorageResult<Product> {
        let conn = self.ready().await?;
        let now = Utc::now().fixed_offset();
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            quantity: Set(fields.quantity),
            price: Set(fields.price),
            img: Set(fields.img),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(conn).await?;

        tracing::info!(product_id = %model.id, "product created");
        Ok(product_from_entity(model))
    }

    #[instrument(skip(self, changes))]
    async fn update_by_id(
        &self,
        id: &str,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>> {
        let key = Self::parse_id(id)?;
        let conn = self.ready().await?;
        let Some(existing) = Products::find_by_id(key).one(conn).await? else {
            return Ok(None);
        };

        let result = active_changes(existing, changes, Utc::now())
            .update(conn)
            .await;
        let Some(model) = updated_or_missing(result)? else {
            return Ok(None);
        };

        tracing::info!(product_id = %id, "product updated");
        Ok(Some(product_from_entity(model)))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let key = Self::parse_id(id)?;
        let conn = self.ready().await?;
        let Some(existing) = Products::find_by_id(key).one(conn).await? else {
            return Ok(None);
        };

        let result = Products::delete_by_id(key).exec(conn).await?;
        if result.rows_affected == 0 {
            // Removed by a concurrent request between the read and the delete.
            return Ok(None);
        }

        tracing::info!(product_id = %id, "product deleted");
        Ok(Some(product_from_entity(existing)))
    }

    async fn ping(&self) -> StorageResult<()> {
        self.conn.ping().await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
