use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors that can occur while turning a document into chunks
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Content is binary or not valid UTF-8; the document should be skipped
    #[error("Unreadable document {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ChunkError {
    /// Create an unreadable-content error
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Whether the error only affects a single document
    #[must_use]
    pub const fn is_document_local(&self) -> bool {
        matches!(self, Self::Unreadable { .. } | Self::IoError(_))
    }
}
