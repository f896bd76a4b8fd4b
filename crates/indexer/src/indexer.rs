use crate::error::{IndexerError, Result};
use crate::fingerprint::{corpus_fingerprint, CorpusHasher};
use crate::scanner::FileScanner;
use crate::stats::IndexStats;
use docqa_chunker::{Chunk, ChunkError, Chunker, Document};
use docqa_vector_store::{
    EmbeddingClient, IndexError, IndexHandle, IndexSpec, VectorIndex, VectorRecord,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// How [`DocumentIndexer::open_or_build`] obtained its index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A compatible snapshot was loaded from disk
    Loaded,
    /// The snapshot was missing or incompatible and has been rebuilt
    Built(IndexStats),
}

/// Whether the docs directory still matches the indexed corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staleness {
    pub stale: bool,
    pub indexed_fingerprint: Option<String>,
    pub current_fingerprint: String,
}

impl Staleness {
    #[must_use]
    pub fn assess(indexed: Option<&str>, current: String) -> Self {
        Self {
            stale: indexed != Some(current.as_str()),
            indexed_fingerprint: indexed.map(str::to_string),
            current_fingerprint: current,
        }
    }
}

/// Default number of documents chunked at once
#[must_use]
pub fn default_chunk_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}

/// Build pipeline: scan, read, chunk, embed, add, save, swap
pub struct DocumentIndexer {
    root: PathBuf,
    snapshot_path: PathBuf,
    chunker: Chunker,
    client: EmbeddingClient,
    chunk_concurrency: usize,
}

struct DocumentOutcome {
    path: String,
    bytes: Option<Vec<u8>>,
    result: std::result::Result<Vec<Chunk>, ChunkError>,
}

impl DocumentIndexer {
    pub fn new(
        root: impl AsRef<Path>,
        snapshot_path: impl AsRef<Path>,
        chunker: Chunker,
        client: EmbeddingClient,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            chunker,
            client,
            chunk_concurrency: default_chunk_concurrency(),
        }
    }

    #[must_use]
    pub fn with_chunk_concurrency(mut self, concurrency: usize) -> Self {
        self.chunk_concurrency = concurrency.max(1);
        self
    }

    /// Model and dimension every index built here is bound to
    #[must_use]
    pub fn spec(&self) -> IndexSpec {
        IndexSpec::new(self.client.model_id(), self.client.dimension())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    #[must_use]
    pub const fn client(&self) -> &EmbeddingClient {
        &self.client
    }

    /// Build a complete index from the docs directory without touching disk
    /// state or any published index
    pub async fn build(&self) -> Result<(VectorIndex, IndexStats)> {
        let start = Instant::now();
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(self.root.display().to_string()));
        }

        log::info!("Indexing documents under {}", self.root.display());

        // 1. Scan
        let scanner = FileScanner::new(&self.root);
        let files = scanner.scan();

        // 2. Read + chunk
        let mut stats = IndexStats::new();
        let mut hasher = CorpusHasher::new();
        let mut chunks = Vec::new();

        for outcome in self.chunk_documents(&scanner, files).await {
            hasher.add(&outcome.path, outcome.bytes.as_deref());
            match outcome.result {
                Ok(doc_chunks) => {
                    let bytes = outcome.bytes.as_deref().unwrap_or_default();
                    let category = docqa_chunker::FileCategory::from_path(&outcome.path);
                    let language = doc_chunks.first().and_then(|c| c.language.as_deref());
                    stats.add_document(category.as_str(), language, count_lines(bytes));
                    stats.add_chunks(doc_chunks.len());
                    chunks.extend(doc_chunks);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {e}", outcome.path);
                    stats.add_error(format!("{}: {e}", outcome.path));
                }
            }
        }
        log::info!(
            "Chunked {} documents into {} chunks ({} skipped)",
            stats.documents,
            stats.chunks,
            stats.skipped
        );

        // 3. Embed
        let texts: Vec<String> = chunks.iter().map(Chunk::embedding_text).collect();
        let vectors = self.client.embed(&texts).await?;

        // 4. Add
        let mut index = VectorIndex::new(self.spec());
        index.add(
            chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| VectorRecord::new(chunk, vector))
                .collect(),
        )?;
        index.set_corpus_fingerprint(hasher.finish());
        index.set_built_at(unix_now());

        stats.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Built index with {} vectors ({}, dim {}) in {} ms",
            index.len(),
            index.model_id(),
            index.dimension(),
            stats.time_ms
        );
        Ok((index, stats))
    }

    /// Build, persist and publish a new index. On any failure the snapshot
    /// file and the published index stay as they were.
    pub async fn rebuild(&self, handle: &IndexHandle) -> Result<IndexStats> {
        let _guard = handle.lock_rebuild().await;
        let (index, stats) = self.build().await?;
        index.save(&self.snapshot_path).await?;
        handle.replace(index);
        Ok(stats)
    }

    /// Load the snapshot if it is compatible with the configured model,
    /// otherwise build one
    pub async fn open_or_build(&self) -> Result<(IndexHandle, OpenOutcome)> {
        let spec = self.spec();

        if tokio::fs::try_exists(&self.snapshot_path).await? {
            match VectorIndex::load(&self.snapshot_path, &spec).await {
                Ok(index) => return Ok((IndexHandle::new(index), OpenOutcome::Loaded)),
                Err(e @ (IndexError::IncompatibleSnapshot(_) | IndexError::Serialization(_))) => {
                    log::warn!(
                        "Snapshot {} cannot be used ({e}); rebuilding",
                        self.snapshot_path.display()
                    );
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            log::info!(
                "No snapshot at {}; building index",
                self.snapshot_path.display()
            );
        }

        let handle = IndexHandle::new(VectorIndex::new(spec));
        let stats = self.rebuild(&handle).await?;
        Ok((handle, OpenOutcome::Built(stats)))
    }

    /// Compare the index's corpus fingerprint with the docs directory
    pub async fn staleness(&self, index: &VectorIndex) -> Staleness {
        let current = corpus_fingerprint(&self.root).await;
        Staleness::assess(index.corpus_fingerprint(), current)
    }

    /// Read and chunk documents on the blocking pool in bounded waves.
    /// Outcomes come back in the order of `files`.
    async fn chunk_documents(
        &self,
        scanner: &FileScanner,
        files: Vec<PathBuf>,
    ) -> Vec<DocumentOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());

        for wave in files.chunks(self.chunk_concurrency) {
            let mut tasks = Vec::with_capacity(wave.len());
            for file_path in wave {
                let relative = scanner.relative_path(file_path);
                let file_path = file_path.clone();
                let chunker = self.chunker.clone();
                let task_path = relative.clone();
                let task = tokio::task::spawn_blocking(move || {
                    read_and_chunk(&chunker, &file_path, task_path)
                });
                tasks.push((relative, task));
            }

            for (relative, task) in tasks {
                match task.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => outcomes.push(DocumentOutcome {
                        path: relative.clone(),
                        bytes: None,
                        result: Err(ChunkError::unreadable(relative, format!("task failed: {e}"))),
                    }),
                }
            }
        }

        outcomes
    }
}

fn read_and_chunk(chunker: &Chunker, file_path: &Path, relative: String) -> DocumentOutcome {
    let bytes = match std::fs::read(file_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return DocumentOutcome {
                path: relative,
                bytes: None,
                result: Err(ChunkError::IoError(e)),
            }
        }
    };

    let document = Document::from_path(relative, bytes);
    let result = chunker.chunk(&document);
    DocumentOutcome {
        path: document.path,
        bytes: Some(document.bytes),
        result,
    }
}

fn count_lines(bytes: &[u8]) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    newlines + usize::from(!bytes.ends_with(b"\n"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
