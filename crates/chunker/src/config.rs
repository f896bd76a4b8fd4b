use serde::{Deserialize, Serialize};

/// Configuration for chunking behavior.
///
/// Sizes are measured in bytes of UTF-8 text. `max_chunk_size` is a hard limit that no emitted
/// chunk text exceeds; `min_chunk_size` is the threshold under which neighbouring pieces of the
/// same context are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes (hard limit)
    pub max_chunk_size: usize,

    /// Minimum chunk size in bytes (smaller pieces get merged when they fit)
    pub min_chunk_size: usize,

    /// Trailing context carried into the next piece when a code unit is split by size
    pub code_overlap: usize,

    /// Data rows per tabular chunk (the header row is added on top)
    pub rows_per_chunk: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 4000,
            min_chunk_size: 64,
            code_overlap: 200,
            rows_per_chunk: 20,
        }
    }
}

impl ChunkerConfig {
    /// Smaller chunks for embedding models with short context windows
    pub fn for_small_models() -> Self {
        Self {
            max_chunk_size: 1500,
            min_chunk_size: 48,
            code_overlap: 120,
            rows_per_chunk: 10,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        // Forced splits must always make progress over multi-byte characters.
        if self.max_chunk_size < 16 {
            return Err(format!(
                "max_chunk_size ({}) must be at least 16",
                self.max_chunk_size
            ));
        }

        if self.min_chunk_size > self.max_chunk_size {
            return Err(format!(
                "min_chunk_size ({}) cannot exceed max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            ));
        }

        if self.code_overlap == 0 {
            return Err("code_overlap must be > 0".to_string());
        }

        if self.code_overlap.saturating_mul(2) >= self.max_chunk_size {
            return Err(format!(
                "code_overlap ({}) must be less than half of max_chunk_size ({})",
                self.code_overlap, self.max_chunk_size
            ));
        }

        if self.rows_per_chunk == 0 {
            return Err("rows_per_chunk must be > 0".to_string());
        }

        Ok(())
    }
}
