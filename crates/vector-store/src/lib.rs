//! # docqa vector store
//!
//! Embedding client and persistent in-memory vector index.
//!
//! ## Architecture
//!
//! ```text
//! Chunks ──> EmbeddingClient (batches, concurrency, retry + timeout)
//!               │        └─> EmbeddingProvider (OpenAI-compatible HTTP / hash stub)
//!               v
//!          VectorRecord ──> VectorIndex (all-or-nothing add, cosine top-k)
//!                              │   └─> NeighborSearch (FlatScan)
//!                              ├─> save / load (JSON snapshot, atomic rename)
//!                              └─> IndexHandle (Arc snapshots, serialized rebuilds)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docqa_vector_store::{IndexSpec, VectorIndex, VectorRecord};
//! use docqa_chunker::Chunker;
//!
//! let chunks = Chunker::default().chunk_str("# A\n\nalpha\n\n# B\n\nbeta\n", "a.md").unwrap();
//! let mut index = VectorIndex::new(IndexSpec::new("demo", 2));
//! index.add(vec![
//!     VectorRecord::new(chunks[0].clone(), vec![1.0, 0.0]),
//!     VectorRecord::new(chunks[1].clone(), vec![0.0, 1.0]),
//! ]).unwrap();
//!
//! let result = index.search(&[0.0, 1.0], 1).unwrap();
//! assert_eq!(result.hits[0].chunk.header_context, vec!["B"]);
//! ```

mod embeddings;
mod error;
mod flat;
mod handle;
mod hash;
mod index;
mod openai;
mod snapshot;
mod types;

pub use embeddings::{EmbeddingClient, EmbeddingClientConfig, EmbeddingProvider, RetryPolicy};
pub use error::{EmbedError, IndexError, ProviderError, Result};
pub use flat::{FlatScan, Neighbor, NeighborSearch};
pub use handle::IndexHandle;
pub use hash::HashEmbeddingProvider;
pub use index::VectorIndex;
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_BASE_URL, DEFAULT_DIMENSION, DEFAULT_MODEL};
pub use snapshot::{read_snapshot_info, SnapshotInfo, SNAPSHOT_SCHEMA_VERSION};
pub use types::{IndexSpec, QueryResult, ScoredChunk, VectorRecord};
