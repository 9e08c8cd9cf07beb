use thiserror::Error;

/// Result alias for layer and overlay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the in-memory layer transforms.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or ambiguous column, inconsistent layer, or other bad argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Layers participating in one operation declare different CRSs.
    #[error("CRS mismatch: {left} vs {right}")]
    GeometryMismatch { left: String, right: String },

    /// Format or operation the collaborator cannot handle.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn missing_column(col: &str, available: &[String]) -> Self {
        Self::InvalidInput(format!("column {col:?} not found (available: {available:?})"))
    }
}
