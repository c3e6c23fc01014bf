use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier; opaque to clients.
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted by the store on insert, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub img: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub img: Option<String>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.price.is_none() && self.img.is_none()
    }

    /// Apply the changes in place and stamp `updated_at`.
    pub fn apply_to(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(img) = self.img {
            product.img = Some(img);
        }
        product.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Product {
        let now = Utc::now();
        Product {
            id: "p1".into(),
            name: "Widget".into(),
            quantity: 0,
            price: 5.0,
            img: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serializes_with_camel_case_timestamps_and_no_img() {
        let json = serde_json::to_value(widget()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("img").is_none());
        assert_eq!(json["quantity"], 0);
    }

    #[test]
    fn apply_to_only_touches_given_fields() {
        let mut product = widget();
        let later = product.updated_at + chrono::Duration::seconds(1);
        ProductChanges {
            price: Some(9.99),
            ..Default::default()
        }
        .apply_to(&mut product, later);

        assert_eq!(product.price, 9.99);
        assert_eq!(product.name, "Widget");
        assert_eq!(product.quantity, 0);
        assert_eq!(product.updated_at, later);
    }
}
