use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Retrieval failed; distinct from a successful query with no hits
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding error: {0}")]
    Embed(#[from] docqa_vector_store::EmbedError),

    #[error("Index error: {0}")]
    Index(#[from] docqa_vector_store::IndexError),
}
