use crate::config::{ConfigError, DocqaConfig, EmbedMode};
use crate::report::{
    ChunkReport, HitReport, IndexReport, InfoReport, SearchReport, SnapshotReport,
};
use anyhow::{Context, Result};
use docqa_chunker::{Chunker, ChunkingStats, PREVIEW_CHARS};
use docqa_indexer::{corpus_fingerprint, DocumentIndexer, OpenOutcome, Staleness};
use docqa_search::Retriever;
use docqa_vector_store::{
    read_snapshot_info, EmbeddingClient, EmbeddingProvider, HashEmbeddingProvider, IndexError,
    IndexHandle, IndexSpec, OpenAiEmbeddingProvider, VectorIndex, DEFAULT_BASE_URL,
};
use std::path::Path;
use std::sync::Arc;

pub const APP_NAME: &str = "docqa";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Provider selected by the configured mode
pub fn embedding_provider(config: &DocqaConfig) -> Result<Arc<dyn EmbeddingProvider>, ConfigError> {
    let settings = &config.embedding;
    match settings.mode {
        EmbedMode::Stub => Ok(Arc::new(HashEmbeddingProvider::new(settings.dimension))),
        EmbedMode::Openai => {
            let has_key = settings
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty());
            if !has_key && settings.base_url.trim_end_matches('/') == DEFAULT_BASE_URL {
                return Err(ConfigError::Invalid(
                    "an API key is required for the OpenAI endpoint (set DOCQA_API_KEY or OPENAI_API_KEY, or use --embed-mode stub)"
                        .to_string(),
                ));
            }
            Ok(Arc::new(OpenAiEmbeddingProvider::new(
                settings.base_url.clone(),
                settings.api_key.clone(),
                settings.model.clone(),
                settings.dimension,
            )))
        }
    }
}

pub fn embedding_client(config: &DocqaConfig) -> Result<EmbeddingClient, ConfigError> {
    Ok(EmbeddingClient::new(embedding_provider(config)?)
        .with_config(config.embedding.client_config())
        .with_retry_policy(config.embedding.retry_policy()))
}

pub fn chunker(config: &DocqaConfig) -> Result<Chunker> {
    Chunker::new(config.chunker.clone()).context("invalid chunker settings")
}

pub fn document_indexer(config: &DocqaConfig) -> Result<DocumentIndexer> {
    let mut indexer = DocumentIndexer::new(
        &config.docs_dir,
        &config.index.snapshot_path,
        chunker(config)?,
        embedding_client(config)?,
    );
    if let Some(concurrency) = config.index.chunk_concurrency {
        indexer = indexer.with_chunk_concurrency(concurrency);
    }
    Ok(indexer)
}

/// `index`: keep a compatible snapshot unless `force`, otherwise build and save
pub async fn run_index(config: &DocqaConfig, force: bool) -> Result<IndexReport> {
    let indexer = document_indexer(config)?;

    let (handle, stats) = if force {
        let handle = IndexHandle::new(VectorIndex::new(indexer.spec()));
        let stats = indexer
            .rebuild(&handle)
            .await
            .with_context(|| format!("failed to index {}", config.docs_dir.display()))?;
        (handle, Some(stats))
    } else {
        let (handle, outcome) = indexer
            .open_or_build()
            .await
            .with_context(|| format!("failed to index {}", config.docs_dir.display()))?;
        match outcome {
            OpenOutcome::Loaded => (handle, None),
            OpenOutcome::Built(stats) => (handle, Some(stats)),
        }
    };

    let index = handle.snapshot();
    Ok(IndexReport {
        snapshot_path: config.index.snapshot_path.display().to_string(),
        rebuilt: stats.is_some(),
        model_id: index.model_id().to_string(),
        dimension: index.dimension(),
        records: index.len(),
        stats,
    })
}

/// `search`: open (or first-boot build) the index and retrieve the top `k` passages
pub async fn run_search(config: &DocqaConfig, query: &str, k: usize) -> Result<SearchReport> {
    let indexer = document_indexer(config)?;
    let (handle, outcome) = indexer
        .open_or_build()
        .await
        .context("failed to open the index")?;
    if let OpenOutcome::Built(stats) = &outcome {
        log::info!(
            "Built index on first use: {} documents, {} chunks",
            stats.documents,
            stats.chunks
        );
    }

    let retriever = Retriever::new(Arc::new(handle), indexer.client().clone());
    let result = retriever
        .retrieve(query, k)
        .await
        .with_context(|| format!("search failed for query {query:?}"))?;

    Ok(SearchReport {
        query: query.to_string(),
        k,
        hits: result
            .iter()
            .enumerate()
            .map(|(rank, hit)| HitReport::new(rank + 1, hit, PREVIEW_CHARS))
            .collect(),
    })
}

/// `info`: snapshot metadata plus staleness against the docs directory.
/// Never calls the embedding provider.
pub async fn run_info(config: &DocqaConfig) -> Result<InfoReport> {
    let settings = &config.embedding;
    let expected_model = match settings.mode {
        EmbedMode::Stub => HashEmbeddingProvider::new(settings.dimension)
            .model_id()
            .to_string(),
        EmbedMode::Openai => settings.model.clone(),
    };
    let spec = IndexSpec::new(expected_model.clone(), settings.dimension);

    let snapshot = match read_snapshot_info(&config.index.snapshot_path).await {
        Ok(info) => {
            let compatible = info.check(&spec).is_ok();
            let staleness = if config.docs_dir.is_dir() {
                let current = corpus_fingerprint(&config.docs_dir).await;
                Some(Staleness::assess(info.corpus_fingerprint.as_deref(), current))
            } else {
                None
            };
            Some(SnapshotReport {
                info,
                compatible,
                staleness,
            })
        }
        Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No snapshot at {}", config.index.snapshot_path.display());
            None
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "failed to read snapshot {}",
                    config.index.snapshot_path.display()
                )
            })
        }
    };

    Ok(InfoReport {
        name: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        embedding_mode: settings.mode.as_str().to_string(),
        embedding_model: expected_model,
        dimension: settings.dimension,
        docs_dir: config.docs_dir.display().to_string(),
        snapshot_path: config.index.snapshot_path.display().to_string(),
        snapshot,
    })
}

/// `chunk`: split one file with the configured chunker, no embedding
pub fn run_chunk(config: &DocqaConfig, file: &Path) -> Result<ChunkReport> {
    let chunks = chunker(config)?
        .chunk_file(file)
        .with_context(|| format!("failed to chunk {}", file.display()))?;
    Ok(ChunkReport {
        path: file.display().to_string(),
        stats: ChunkingStats::from_chunks(&chunks),
        chunks,
    })
}
