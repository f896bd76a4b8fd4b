use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics about an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents chunked successfully (including ones that produced no chunks)
    pub documents: usize,

    /// Number of chunks created
    pub chunks: usize,

    /// Documents skipped because they could not be read or decoded
    pub skipped: usize,

    /// Total lines across indexed documents
    pub total_lines: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Documents per file category
    pub categories: BTreeMap<String, usize>,

    /// Documents per code language
    pub languages: BTreeMap<String, usize>,

    /// One entry per skipped document
    pub errors: Vec<String>,
}

impl IndexStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, category: &str, language: Option<&str>, lines: usize) {
        self.documents += 1;
        self.total_lines += lines;
        *self.categories.entry(category.to_string()).or_insert(0) += 1;
        if let Some(language) = language {
            *self.languages.entry(language.to_string()).or_insert(0) += 1;
        }
    }

    pub fn add_chunks(&mut self, count: usize) {
        self.chunks += count;
    }

    pub fn add_error(&mut self, error: String) {
        self.skipped += 1;
        self.errors.push(error);
    }
}
