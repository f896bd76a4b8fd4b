//! # docqa chunker
//!
//! File-type-aware chunking of documentation and source code for semantic retrieval.
//!
//! ## Strategies
//!
//! ```text
//! Document (path, category, bytes)
//!     │
//!     ├──> Decode (binary / non-UTF-8 → ChunkError::Unreadable)
//!     │
//!     ├──> FileCategory → ChunkStrategy
//!     │    ├─> prose    → sections   (heading path kept as header_context)
//!     │    ├─> code     → structure  (tree-sitter or heuristics, signature as code_context)
//!     │    ├─> tabular  → row groups (header row repeated)
//!     │    └─> config / other → paragraphs
//!     │
//!     └──> Chunk[] in document order, non-overlapping offset spans,
//!          every text within max_chunk_size bytes
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docqa_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//!
//! let doc = "# API Reference\n\n## Authentication\n\nSend a bearer token.\n";
//! let chunks = chunker.chunk_str(doc, "docs/api.md").unwrap();
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].header_context, vec!["API Reference", "Authentication"]);
//! assert_eq!(chunks[0].text, "Send a bearer token.");
//! ```

mod ast_analyzer;
mod category;
mod chunker;
mod code;
mod config;
mod error;
mod language;
mod markdown;
mod strategy;
mod structure;
mod tabular;
mod text;
mod types;

pub use category::{ChunkStrategy, FileCategory};
pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::{ChunkError, Result};
pub use language::{Language, LanguageFamily};
pub use types::{Chunk, ChunkingStats, Document, PREVIEW_CHARS};
