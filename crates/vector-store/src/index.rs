use crate::error::{IndexError, Result};
use crate::flat::{FlatScan, NeighborSearch};
use crate::types::{IndexSpec, QueryResult, ScoredChunk, VectorRecord};
use docqa_chunker::Chunk;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) chunk_id: String,
    pub(crate) chunk: Chunk,
}

/// In-memory vector index bound to one embedding model and dimension
pub struct VectorIndex {
    spec: IndexSpec,
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
    backend: Box<dyn NeighborSearch>,
    built_at: Option<u64>,
    corpus_fingerprint: Option<String>,
}

impl VectorIndex {
    /// Create an empty index backed by an exhaustive scan
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        let backend = Box::new(FlatScan::new(spec.dimension));
        Self::with_backend(spec, backend)
    }

    /// Create an empty index over a custom neighbor backend
    #[must_use]
    pub fn with_backend(spec: IndexSpec, backend: Box<dyn NeighborSearch>) -> Self {
        Self {
            spec,
            entries: Vec::new(),
            positions: HashMap::new(),
            backend,
            built_at: None,
            corpus_fingerprint: None,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.spec.model_id
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.spec.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unix seconds of the build this index was saved from or loaded out of
    #[must_use]
    pub const fn built_at(&self) -> Option<u64> {
        self.built_at
    }

    pub fn set_built_at(&mut self, built_at: u64) {
        self.built_at = Some(built_at);
    }

    #[must_use]
    pub fn corpus_fingerprint(&self) -> Option<&str> {
        self.corpus_fingerprint.as_deref()
    }

    pub fn set_corpus_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.corpus_fingerprint = Some(fingerprint.into());
    }

    #[must_use]
    pub fn contains(&self, chunk_id: &str) -> bool {
        self.positions.contains_key(chunk_id)
    }

    #[must_use]
    pub fn get(&self, chunk_id: &str) -> Option<&Chunk> {
        self.positions
            .get(chunk_id)
            .map(|&position| &self.entries[position].chunk)
    }

    /// Add records. Every record is validated before any is stored, so a
    /// failed call leaves the index unchanged.
    pub fn add(&mut self, records: Vec<VectorRecord>) -> Result<()> {
        let mut incoming = HashSet::with_capacity(records.len());
        for record in &records {
            if record.vector.len() != self.spec.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.spec.dimension,
                    actual: record.vector.len(),
                });
            }
            if self.positions.contains_key(&record.chunk_id)
                || !incoming.insert(record.chunk_id.as_str())
            {
                return Err(IndexError::DuplicateId(record.chunk_id.clone()));
            }
        }

        let added = records.len();
        for record in records {
            let position = self.entries.len();
            self.backend.push(&record.vector);
            self.positions.insert(record.chunk_id.clone(), position);
            self.entries.push(Entry {
                chunk_id: record.chunk_id,
                chunk: record.chunk,
            });
        }

        log::debug!("Added {added} vectors (total: {})", self.entries.len());
        Ok(())
    }

    /// Top `k` chunks by cosine similarity to `query`, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<QueryResult> {
        if k == 0 {
            return Ok(QueryResult::empty());
        }
        if self.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if query.len() != self.spec.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.spec.dimension,
                actual: query.len(),
            });
        }

        let hits = self
            .backend
            .nearest(query, k)
            .into_iter()
            .map(|neighbor| ScoredChunk {
                chunk: self.entries[neighbor.position].chunk.clone(),
                score: neighbor.score,
            })
            .collect();

        Ok(QueryResult { hits })
    }

    /// Stored records in insertion order
    pub fn records(&self) -> impl Iterator<Item = VectorRecord> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| VectorRecord {
                chunk_id: entry.chunk_id.clone(),
                vector: self.backend.vector(position).to_vec(),
                chunk: entry.chunk.clone(),
            })
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn vector_at(&self, position: usize) -> &[f32] {
        self.backend.vector(position)
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("spec", &self.spec)
            .field("len", &self.entries.len())
            .field("built_at", &self.built_at)
            .field("corpus_fingerprint", &self.corpus_fingerprint)
            .finish_non_exhaustive()
    }
}
