// src/infra/errors.rs - Error types for localchat

use thiserror::Error;

/// A failed round trip to the model backend.
///
/// Covers connection failures, timeouts, non-2xx statuses (direct or
/// relayed) and success bodies that do not carry `message.content`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Exchange failed: {reason}")]
pub struct ExchangeError {
    pub reason: String,
}

impl ExchangeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write was rejected because the payload does not fit.
    #[error("Storage capacity exceeded: {size} bytes (limit {limit})")]
    CapacityExceeded { size: usize, limit: usize },

    /// The device ran out of space mid-write.
    #[error("Storage full while writing {size} bytes")]
    StorageFull { size: usize },

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            StoreError::CapacityExceeded { .. } | StoreError::StorageFull { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum LocalChatError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
