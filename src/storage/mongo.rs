//! MongoDB implementation of ProductStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Document, doc, oid::ObjectId},
    options::ReturnDocument,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use super::ProductStore;
use crate::error::{StorageError, StorageResult};
use crate::models::{NewProduct, Product, ProductChanges};

pub const COLLECTION: &str = "products";

/// Document shape in the `products` collection. Reads are lenient: extra keys
/// such as `__v` are ignored, a missing `name` or `price` reads as empty/zero,
/// and numbers stored as either int or double are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default, deserialize_with = "stored_text")]
    name: String,
    #[serde(default, deserialize_with = "stored_quantity")]
    quantity: i64,
    #[serde(default, deserialize_with = "stored_price")]
    price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    img: Option<String>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Product {
            id: doc.id.to_hex(),
            name: doc.name,
            quantity: doc.quantity,
            price: doc.price,
            img: doc.img,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredNumber {
    Int(i64),
    Float(f64),
}

fn stored_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn stored_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StoredNumber>::deserialize(deserializer)? {
        Some(StoredNumber::Int(n)) => n as f64,
        Some(StoredNumber::Float(n)) => n,
        None => 0.0,
    })
}

/// Doubles are truncated; values that do not fit an `i64` read as zero.
fn stored_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StoredNumber>::deserialize(deserializer)? {
        Some(StoredNumber::Int(n)) => n,
        Some(StoredNumber::Float(n))
            if n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64 =>
        {
            n.trunc() as i64
        }
        Some(StoredNumber::Float(_)) | None => 0,
    })
}

/// Decode raw documents, skipping the ones that cannot be read as a product.
fn decode_documents(raw: Vec<Document>) -> Vec<Product> {
    raw.into_iter()
        .filter_map(|document| {
            let id = document.get("_id").cloned();
            match bson::from_document::<ProductDocument>(document) {
                Ok(doc) => Some(Product::from(doc)),
                Err(err) => {
                    tracing::warn!(?id, error = %err, "skipping unreadable product document");
                    None
                }
            }
        })
        .collect()
}

pub struct MongoProductStore {
    db: Database,
    collection: Collection<ProductDocument>,
    raw: Collection<Document>,
}

impl MongoProductStore {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection::<ProductDocument>(collection_name),
            raw: db.collection::<Document>(collection_name),
        }
    }

    fn parse_id(id: &str) -> StorageResult<ObjectId> {
        ObjectId::parse_str(id).map_err(|_| StorageError::MalformedId {
            value: id.to_string(),
            expected: "ObjectId",
        })
    }

    /// `$set` document for a partial update; always refreshes `updatedAt`.
    fn build_update(changes: ProductChanges, now: bson::DateTime) -> Document {
        let mut set = doc! { "updatedAt": now };

        if let Some(name) = changes.name {
            set.insert("name", name);
        }
        if let Some(quantity) = changes.quantity {
            set.insert("quantity", quantity);
        }
        if let Some(price) = changes.price {
            set.insert("price", price);
        }
        if let Some(img) = changes.img {
            set.insert("img", img);
        }

        doc! { "$set": set }
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    #[instrument(skip(self))]
    async fn find_all(&self) -> StorageResult<Vec<Product>> {
        let cursor = self.raw.find(doc! {}).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(decode_documents(docs))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let oid = Self::parse_id(id)?;
        let found = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(found.map(Product::from))
    }

    #[instrument(skip(self, fields), fields(product_name = %fields.name))]
    async fn insert(&self, fields: NewProduct) -> StorageResult<Product> {
        let now = bson::DateTime::now();
        let document = ProductDocument {
            id: ObjectId::new(),
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            img: fields.img,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&document).await?;

        tracing::info!(product_id = %document.id, "product created");
        Ok(document.into())
    }

    #[instrument(skip(self, changes))]
    async fn update_by_id(
        &self,
        id: &str,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>> {
        let oid = Self::parse_id(id)?;
        let update = Self::build_update(changes, bson::DateTime::now());

        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(product_id = %id, "product updated");
        }
        Ok(updated.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        let oid = Self::parse_id(id)?;
        let deleted = self
            .collection
            .find_one_and_delete(doc! { "_id": oid })
            .await?;

        if deleted.is_some() {
            tracing::info!(product_id = %id, "product deleted");
        }
        Ok(deleted.map(Product::from))
    }

    async fn ping(&self) -> StorageResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_sets_given_fields() {
        let now = bson::DateTime::now();
        let update = MongoProductStore::build_update(
            ProductChanges {
                price: Some(9.99),
                ..Default::default()
            },
            now,
        );

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_f64("price").unwrap(), 9.99);
        assert_eq!(set.get_datetime("updatedAt").unwrap(), &now);
        assert!(!set.contains_key("name"));
        assert!(!set.contains_key("quantity"));
    }

    #[test]
    fn malformed_object_id_is_rejected() {
        let err = MongoProductStore::parse_id("123").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cast to ObjectId failed for value \"123\" at path \"id\""
        );
    }

    #[test]
    fn document_maps_to_product() {
        let oid = ObjectId::new();
        let at = bson::DateTime::from_millis(1_700_000_000_000);
        let product = Product::from(ProductDocument {
            id: oid,
            name: "Widget".into(),
            quantity: 2,
            price: 5.0,
            img: Some("https://example.com/w.png".into()),
            created_at: at,
            updated_at: at,
        });

        assert_eq!(product.id, oid.to_hex());
        assert_eq!(product.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn legacy_document_without_quantity_reads_as_zero() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "name": "Old",
            "price": 3,
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
            "__v": 0,
        };
        let parsed: ProductDocument = bson::from_document(raw).unwrap();
        assert_eq!(parsed.quantity, 0);
        assert_eq!(parsed.price, 3.0);
    }

    #[test]
    fn legacy_document_without_name_or_price_reads_as_defaults() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "quantity": 0,
            "price": null,
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
            "__v": 0,
        };
        let parsed: ProductDocument = bson::from_document(raw).unwrap();
        assert_eq!(parsed.name, "");
        assert_eq!(parsed.price, 0.0);
    }

    #[test]
    fn double_quantity_is_truncated() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "name": "Half",
            "quantity": 2.5,
            "price": 1.5,
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
        };
        let parsed: ProductDocument = bson::from_document(raw).unwrap();
        assert_eq!(parsed.quantity, 2);

        let huge = doc! {
            "_id": ObjectId::new(),
            "quantity": 1e30,
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
        };
        let parsed: ProductDocument = bson::from_document(huge).unwrap();
        assert_eq!(parsed.quantity, 0);
    }

    #[test]
    fn unreadable_documents_are_skipped_when_listing() {
        let now = bson::DateTime::now();
        let good = doc! {
            "_id": ObjectId::new(),
            "name": "Widget",
            "price": 5,
            "createdAt": now,
            "updatedAt": now,
        };
        let broken = doc! { "_id": ObjectId::new(), "name": "No timestamps" };

        let products = decode_documents(vec![broken, good]);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Widget");
    }
}
