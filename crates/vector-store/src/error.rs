use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Incompatible snapshot: {0}")]
    IncompatibleSnapshot(String),

    #[error("Duplicate chunk id: {0}")]
    DuplicateId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by an [`EmbeddingProvider`](crate::EmbeddingProvider) for one request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Rate limit, timeout, 5xx or connection failure; worth retrying
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// The provider refused the request; retrying will not help
    #[error("provider rejected request: {0}")]
    Fatal(String),
}

impl ProviderError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("Embedding provider unavailable after {attempts} attempts: {last_error}")]
    ProviderUnavailable { attempts: u32, last_error: String },

    #[error("Embedding request rejected: {0}")]
    Rejected(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}
