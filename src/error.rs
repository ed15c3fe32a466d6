use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaygateError>;

#[derive(Error, Debug)]
pub enum PaygateError {
    /// Entity missing, caller unauthorized, payment unverifiable, or a
    /// required fee never configured. These are deliberately merged into a
    /// single kind; callers must match on the variant, not the message.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}

impl PaygateError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }
}
