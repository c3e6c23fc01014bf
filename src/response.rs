use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every non-record response: not-found, validation and failures.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct MessageBody {
    pub message: String,
    /// Per-field validation messages, only present on 400 validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}
