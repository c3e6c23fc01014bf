use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::response::MessageBody;

pub const NOT_FOUND_MESSAGE: &str = "Product not found";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error";

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cast to {expected} failed for value \"{value}\" at path \"id\"")]
    MalformedId { value: String, expected: &'static str },

    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    Orm(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Product not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Product validation failed")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotFound => MessageBody::new(NOT_FOUND_MESSAGE),
            AppError::BadRequest(message) | AppError::PayloadTooLarge(message) => {
                MessageBody::new(message.clone())
            }
            AppError::Validation(errors) => validation_body(errors),
            AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                MessageBody::new(failure_message(&self))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// The error's own message, or a generic fallback when it has none.
fn failure_message(err: &AppError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

fn validation_body(errors: &ValidationErrors) -> MessageBody {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string())
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }

    let summary = fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join(", ");

    MessageBody {
        message: format!("Product validation failed: {summary}"),
        errors: Some(fields),
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::ValidationError;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_has_fixed_message() {
        let (status, body) = body_of(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "message": "Product not found" }));
    }

    #[tokio::test]
    async fn storage_error_surfaces_its_message() {
        let err = StorageError::MalformedId {
            value: "abc".into(),
            expected: "ObjectId",
        };
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["message"],
            "Cast to ObjectId failed for value \"abc\" at path \"id\""
        );
    }

    #[tokio::test]
    async fn storage_error_without_message_falls_back() {
        let (_, body) = body_of(StorageError::Backend(String::new()).into()).await;
        assert_eq!(body["message"], "Unknown Error");
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let mut errors = ValidationErrors::new();
        let mut price = ValidationError::new("required");
        price.message = Some("Product price is required".into());
        errors.add("price", price);

        let (status, body) = body_of(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Product validation failed: price: Product price is required"
        );
        assert_eq!(body["errors"]["price"][0], "Product price is required");
    }
}
