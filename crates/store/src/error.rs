use thiserror::Error;

use crate::shape::Shape;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Display strings double as the client-facing `error` message.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Data not loaded.")]
    NotLoaded,

    #[error("Invalid key path: {0}")]
    InvalidKey(String),

    #[error("Key '{0}' not found.")]
    KeyNotFound(String),

    #[error("Failed to process {} data.", .shape.noun())]
    ShapeMismatch { shape: Shape, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document already loaded")]
    AlreadyLoaded,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl StoreError {
    pub(crate) fn mismatch(shape: Shape, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            shape,
            reason: reason.into(),
        }
    }
}
