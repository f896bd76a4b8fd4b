use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] docqa_chunker::ChunkError),

    #[error("Embedding error: {0}")]
    EmbedError(#[from] docqa_vector_store::EmbedError),

    #[error("Index error: {0}")]
    IndexError(#[from] docqa_vector_store::IndexError),

    #[error("Invalid docs directory: {0}")]
    InvalidPath(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}
