use serde::{Deserialize, Deserializer, de::Error as _};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::models::{NewProduct, ProductChanges};

/// Body of `POST /api/products`. Every field is optional at the wire level so
/// that missing required fields surface as validation errors, not decode errors.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(
        required(message = "Product name is required"),
        length(min = 1, message = "Product name is required")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    #[validate(range(min = 0, message = "Product quantity must not be negative"))]
    pub quantity: Option<i64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    #[validate(required(message = "Product price is required"))]
    pub price: Option<f64>,

    pub img: Option<String>,
}

impl CreateProductRequest {
    /// Run validation and apply defaults.
    pub fn into_new_product(self) -> Result<NewProduct, ValidationErrors> {
        self.validate()?;
        Ok(NewProduct {
            name: self.name.unwrap_or_default(),
            quantity: self.quantity.unwrap_or(0),
            price: self.price.unwrap_or_default(),
            img: self.img,
        })
    }
}

/// Body of `PUT /api/products/{id}`; any subset of fields.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Product name must not be empty"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    #[validate(range(min = 0, message = "Product quantity must not be negative"))]
    pub quantity: Option<i64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,

    pub img: Option<String>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, ValidationErrors> {
        self.validate()?;
        Ok(ProductChanges {
            name: self.name,
            quantity: self.quantity,
            price: self.price,
            img: self.img,
        })
    }
}

// Form bodies carry every value as text, and JSON clients sometimes send
// numbers as strings; both are accepted for numeric fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Numeric>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Numeric::Int(n)) => n as f64,
        Some(Numeric::Float(n)) => n,
        Some(Numeric::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("Cast to Number failed for value \"{text}\"")))?,
    };

    if !value.is_finite() {
        return Err(D::Error::custom("price must be a finite number"));
    }
    Ok(Some(value))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let float_to_int = |n: f64| {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
            Ok(n as i64)
        } else {
            Err(D::Error::custom(format!("quantity must be an integer, got {n}")))
        }
    };

    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Numeric::Int(n)) => Ok(Some(n)),
        Some(Numeric::Float(n)) => float_to_int(n).map(Some),
        Some(Numeric::Text(text)) => {
            let trimmed = text.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Some(n));
            }
            let n = trimmed.parse::<f64>().map_err(|_| {
                D::Error::custom(format!("Cast to Number failed for value \"{text}\""))
            })?;
            float_to_int(n).map(Some)
        }
    }
}
