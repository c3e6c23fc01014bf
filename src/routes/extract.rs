use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Request body accepted either as JSON or as an URL-encoded form, chosen by
/// the `Content-Type` header. Decode failures become 400 responses carrying a
/// `message`.
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
            return Ok(Self(value));
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Oversized bodies keep their 413; every other decode failure is a 400.
fn rejected(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::BadRequest(message)
    }
}
