use crate::scanner::FileScanner;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Incremental SHA-256 over `(path, bytes)` pairs fed in sorted path order
pub struct CorpusHasher {
    hasher: Sha256,
    documents: usize,
}

impl CorpusHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            documents: 0,
        }
    }

    /// Record one document. `None` marks a file that could not be read.
    pub fn add(&mut self, path: &str, bytes: Option<&[u8]>) {
        self.hasher.update((path.len() as u64).to_le_bytes());
        self.hasher.update(path.as_bytes());
        match bytes {
            Some(bytes) => {
                self.hasher.update([1u8]);
                self.hasher.update((bytes.len() as u64).to_le_bytes());
                self.hasher.update(bytes);
            }
            None => self.hasher.update([0u8]),
        }
        self.documents += 1;
    }

    #[must_use]
    pub const fn documents(&self) -> usize {
        self.documents
    }

    /// Lowercase hex digest
    #[must_use]
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

impl Default for CorpusHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint the documents currently under `root`, using the same scan
/// rules as an indexing run
pub async fn corpus_fingerprint(root: impl AsRef<Path>) -> String {
    let root = root.as_ref();
    let scanner = FileScanner::new(root);
    let mut hasher = CorpusHasher::new();
    for path in scanner.scan() {
        let relative = scanner.relative_path(&path);
        match tokio::fs::read(&path).await {
            Ok(bytes) => hasher.add(&relative, Some(&bytes)),
            Err(_) => hasher.add(&relative, None),
        }
    }
    hasher.finish()
}
