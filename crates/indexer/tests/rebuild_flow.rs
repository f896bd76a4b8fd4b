use async_trait::async_trait;
use docqa_chunker::Chunker;
use docqa_indexer::{DocumentIndexer, IndexerError, OpenOutcome};
use docqa_vector_store::{
    read_snapshot_info, EmbedError, EmbeddingClient, EmbeddingProvider, HashEmbeddingProvider,
    ProviderError, RetryPolicy, VectorIndex,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Provider that reports the same model as the hash stub but never answers
struct AlwaysFailing {
    inner: HashEmbeddingProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for AlwaysFailing {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Transient("503 Service Unavailable".to_string()))
    }
}

fn write_docs(root: &Path) {
    std::fs::create_dir_all(root.join("guide")).unwrap();
    std::fs::write(
        root.join("guide/setup.md"),
        "# Setup\n\nInstall the tool.\n\n## Configuration\n\nSet DOCS_DIR.\n",
    )
    .unwrap();
    std::fs::write(
        root.join("api.py"),
        "def handler(event):\n    \"\"\"Handle one event.\"\"\"\n    return event\n",
    )
    .unwrap();
    std::fs::write(root.join("users.csv"), "id,name\n1,ada\n2,grace\n").unwrap();
}

fn hash_indexer(root: &Path, snapshot: &Path, dimension: usize) -> DocumentIndexer {
    let client = EmbeddingClient::new(Arc::new(HashEmbeddingProvider::new(dimension)));
    DocumentIndexer::new(root, snapshot, Chunker::default(), client)
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    write_docs(&docs);
    let snapshot = temp.path().join("vector_db/vector_store.json");
    (temp, docs, snapshot)
}

#[tokio::test]
async fn open_or_build_builds_once_then_loads() {
    let (_temp, docs, snapshot) = setup();
    let indexer = hash_indexer(&docs, &snapshot, 16);

    let (handle, outcome) = indexer.open_or_build().await.unwrap();
    let OpenOutcome::Built(stats) = outcome else {
        panic!("expected a fresh build, got {outcome:?}");
    };
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.chunks, handle.snapshot().len());
    assert!(snapshot.exists());

    let (reopened, outcome) = indexer.open_or_build().await.unwrap();
    assert_eq!(outcome, OpenOutcome::Loaded);
    assert_eq!(
        reopened.snapshot().records().collect::<Vec<_>>(),
        handle.snapshot().records().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn model_change_rebuilds_incompatible_snapshot() {
    let (_temp, docs, snapshot) = setup();
    hash_indexer(&docs, &snapshot, 8).open_or_build().await.unwrap();
    assert_eq!(read_snapshot_info(&snapshot).await.unwrap().dimension, 8);

    let (handle, outcome) = hash_indexer(&docs, &snapshot, 16)
        .open_or_build()
        .await
        .unwrap();
    assert!(matches!(outcome, OpenOutcome::Built(_)));
    assert_eq!(handle.snapshot().dimension(), 16);
    assert_eq!(read_snapshot_info(&snapshot).await.unwrap().dimension, 16);
}

#[tokio::test]
async fn failing_provider_leaves_previous_snapshot_untouched() {
    let (_temp, docs, snapshot) = setup();
    let (handle, _) = hash_indexer(&docs, &snapshot, 8).open_or_build().await.unwrap();
    let before_bytes = std::fs::read(&snapshot).unwrap();
    let before_index = handle.snapshot();

    std::fs::write(docs.join("new.md"), "# New\n\nFresh content.\n").unwrap();

    let failing = Arc::new(AlwaysFailing {
        inner: HashEmbeddingProvider::new(8),
        calls: AtomicUsize::new(0),
    });
    let client = EmbeddingClient::new(failing.clone()).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        jitter: 0.0,
    });
    let indexer = DocumentIndexer::new(&docs, &snapshot, Chunker::default(), client);

    let err = indexer.rebuild(&handle).await.unwrap_err();
    assert!(matches!(
        err,
        IndexerError::EmbedError(EmbedError::ProviderUnavailable { attempts: 3, .. })
    ));
    assert_eq!(failing.calls.load(Ordering::SeqCst), 3);

    assert_eq!(std::fs::read(&snapshot).unwrap(), before_bytes);
    assert!(Arc::ptr_eq(&before_index, &handle.snapshot()));
    assert!(!snapshot.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn rebuilding_unchanged_docs_is_idempotent() {
    let (_temp, docs, snapshot) = setup();
    let indexer = hash_indexer(&docs, &snapshot, 12);

    let (first, _) = indexer.build().await.unwrap();
    let (second, _) = indexer.build().await.unwrap();

    assert_eq!(first.corpus_fingerprint(), second.corpus_fingerprint());
    assert_eq!(
        first.records().collect::<Vec<_>>(),
        second.records().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn staleness_is_reported_after_docs_change() {
    let (_temp, docs, snapshot) = setup();
    let indexer = hash_indexer(&docs, &snapshot, 8);
    let (handle, _) = indexer.open_or_build().await.unwrap();
    assert!(!indexer.staleness(&handle.snapshot()).await.stale);

    std::fs::write(docs.join("guide/setup.md"), "# Setup\n\nChanged.\n").unwrap();
    let staleness = indexer.staleness(&handle.snapshot()).await;
    assert!(staleness.stale);

    let loaded = VectorIndex::load(&snapshot, &indexer.spec()).await.unwrap();
    assert_eq!(
        loaded.corpus_fingerprint(),
        staleness.indexed_fingerprint.as_deref()
    );
}
