// src/relay/types.rs

use serde::{Deserialize, Serialize};

/// Error response body. `error` is a short category, `message` the detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn proxy(message: impl Into<String>) -> Self {
        Self {
            error: "Proxy Error".into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}
