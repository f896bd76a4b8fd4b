use docqa_chunker::Chunk;
use serde::{Deserialize, Serialize};

/// A chunk paired with its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

impl VectorRecord {
    #[must_use]
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            chunk_id: chunk.id.clone(),
            vector,
            chunk,
        }
    }
}

/// Model and dimension an index is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub model_id: String,
    pub dimension: usize,
}

impl IndexSpec {
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]; higher is closer
    pub score: f32,
}

/// Ranked hits, best first. Never longer than the requested k.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub hits: Vec<ScoredChunk>,
}

impl QueryResult {
    #[must_use]
    pub const fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.hits.iter()
    }

    /// Highest score, if any hit exists
    #[must_use]
    pub fn top_score(&self) -> Option<f32> {
        self.hits.first().map(|hit| hit.score)
    }
}

impl IntoIterator for QueryResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}
