//! # docqa search
//!
//! Query-time retrieval: embed the question with the indexing model, then rank
//! chunks of the currently published index by cosine similarity.

mod error;
mod retriever;

pub use error::{Result, RetrievalError};
pub use retriever::Retriever;
