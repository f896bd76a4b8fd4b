use crate::category::FileCategory;
use serde::{Deserialize, Serialize};

/// Characters kept by [`Chunk::preview`] in result listings
pub const PREVIEW_CHARS: usize = 200;

/// A file to be chunked, immutable for the duration of an indexing pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable path relative to the corpus root, `/`-separated
    pub path: String,

    /// Declared file-type category
    pub category: FileCategory,

    /// Raw file content
    pub bytes: Vec<u8>,
}

impl Document {
    /// Create a document with an explicit category
    pub fn new(path: impl Into<String>, category: FileCategory, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            category,
            bytes: bytes.into(),
        }
    }

    /// Create a document whose category is derived from the path extension
    pub fn from_path(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let category = FileCategory::from_path(&path);
        Self::new(path, category, bytes)
    }
}

/// A retrievable passage of a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// `"{source_path}:{seq}"`
    pub id: String,

    /// Source document path
    pub source_path: String,

    /// Category of the source document
    pub file_type: FileCategory,

    /// Language name for code documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Passage text
    pub text: String,

    /// Heading path from the document root down to this passage
    #[serde(default)]
    pub header_context: Vec<String>,

    /// Signature of the enclosing function/class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,

    /// Byte offset of the passage start (inclusive)
    pub start_offset: usize,

    /// Byte offset of the passage end (exclusive)
    pub end_offset: usize,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,
}

impl Chunk {
    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Heading path joined for display, e.g. `API Reference > Authentication`
    pub fn header_path(&self) -> String {
        self.header_context.join(" > ")
    }

    /// Text sent to the embedding model: location and context lines, then the passage.
    pub fn embedding_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 128);
        out.push_str(&self.source_path);
        out.push('\n');
        if !self.header_context.is_empty() {
            out.push_str(&self.header_path());
            out.push('\n');
        }
        if let Some(ctx) = &self.code_context {
            out.push_str(ctx);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.text);
        out
    }

    /// First `max_chars` characters of the text, with `...` appended when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

/// Aggregate figures for one chunking pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_bytes: usize,
    pub max_chunk_bytes: usize,
    pub with_header_context: usize,
    pub with_code_context: usize,
}

impl ChunkingStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        chunks.iter().fold(Self::default(), |mut acc, chunk| {
            acc.total_chunks += 1;
            acc.total_bytes += chunk.text.len();
            acc.max_chunk_bytes = acc.max_chunk_bytes.max(chunk.text.len());
            if !chunk.header_context.is_empty() {
                acc.with_header_context += 1;
            }
            if chunk.code_context.is_some() {
                acc.with_code_context += 1;
            }
            acc
        })
    }

    /// Mean text length in bytes
    pub fn average_bytes(&self) -> usize {
        if self.total_chunks == 0 {
            0
        } else {
            self.total_bytes / self.total_chunks
        }
    }
}
