//! # docqa indexer
//!
//! Build pipeline that turns a docs directory into a persisted vector index.
//!
//! ## Pipeline
//!
//! ```text
//! Docs directory
//!     │
//!     ├──> File Scanner (.gitignore aware, sorted)
//!     │      └─> Documents
//!     │
//!     ├──> Chunker (blocking pool, bounded waves)
//!     │      └─> Chunks (+ corpus fingerprint, skipped documents)
//!     │
//!     ├──> Embedding Client (batched, concurrent, retried)
//!     │      └─> Vector records
//!     │
//!     └──> Vector Index ──> snapshot (temp file + rename) ──> IndexHandle swap
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docqa_chunker::Chunker;
//! use docqa_indexer::DocumentIndexer;
//! use docqa_vector_store::{EmbeddingClient, HashEmbeddingProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EmbeddingClient::new(Arc::new(HashEmbeddingProvider::new(256)));
//!     let indexer = DocumentIndexer::new("./docs", "./vector_db/vector_store.json", Chunker::default(), client);
//!     let (handle, _outcome) = indexer.open_or_build().await?;
//!
//!     println!("Serving {} chunks", handle.snapshot().len());
//!     Ok(())
//! }
//! ```

mod error;
mod fingerprint;
mod indexer;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use fingerprint::{corpus_fingerprint, CorpusHasher};
pub use indexer::{default_chunk_concurrency, DocumentIndexer, OpenOutcome, Staleness};
pub use scanner::FileScanner;
pub use stats::IndexStats;
