use crate::error::{IndexError, Result};
use crate::index::VectorIndex;
use crate::types::{IndexSpec, VectorRecord};
use docqa_chunker::Chunk;
use serde::{de::IgnoredAny, Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Snapshot header without the record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub schema_version: u32,
    pub model_id: String,
    pub dimension: usize,
    /// Unix seconds
    pub created_at: u64,
    pub corpus_fingerprint: Option<String>,
    pub records: usize,
}

#[derive(Serialize)]
struct PersistedSnapshotRef<'a> {
    schema_version: u32,
    model_id: &'a str,
    dimension: usize,
    created_at: u64,
    corpus_fingerprint: Option<&'a str>,
    records: Vec<PersistedRecordRef<'a>>,
}

#[derive(Serialize)]
struct PersistedRecordRef<'a> {
    chunk_id: &'a str,
    vector: &'a [f32],
    chunk: &'a Chunk,
}

#[derive(Deserialize)]
struct PersistedSnapshot {
    schema_version: u32,
    model_id: String,
    dimension: usize,
    created_at: u64,
    #[serde(default)]
    corpus_fingerprint: Option<String>,
    records: Vec<VectorRecord>,
}

#[derive(Deserialize)]
struct PersistedHeader {
    schema_version: u32,
    model_id: String,
    dimension: usize,
    created_at: u64,
    #[serde(default)]
    corpus_fingerprint: Option<String>,
    records: Vec<IgnoredAny>,
}

impl VectorIndex {
    /// Persist the index as JSON. The file is written next to `path` and
    /// renamed into place, so readers never observe a partial snapshot.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let persisted = PersistedSnapshotRef {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            model_id: self.model_id(),
            dimension: self.dimension(),
            created_at: self.built_at().unwrap_or_else(unix_now),
            corpus_fingerprint: self.corpus_fingerprint(),
            records: self
                .entries()
                .iter()
                .enumerate()
                .map(|(position, entry)| PersistedRecordRef {
                    chunk_id: &entry.chunk_id,
                    vector: self.vector_at(position),
                    chunk: &entry.chunk,
                })
                .collect(),
        };
        let bytes = serde_json::to_vec(&persisted)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        log::info!(
            "Saved index snapshot to {} ({} records)",
            path.display(),
            self.len()
        );
        Ok(())
    }

    /// Load a snapshot, rejecting one built for a different model, dimension
    /// or schema
    pub async fn load(path: impl AsRef<Path>, spec: &IndexSpec) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let persisted: PersistedSnapshot = serde_json::from_slice(&bytes)?;

        check_compatible(
            persisted.schema_version,
            &persisted.model_id,
            persisted.dimension,
            spec,
        )?;

        let mut index = Self::new(spec.clone());
        index.add(persisted.records).map_err(|e| {
            IndexError::IncompatibleSnapshot(format!("corrupt record set: {e}"))
        })?;
        index.set_built_at(persisted.created_at);
        if let Some(fingerprint) = persisted.corpus_fingerprint {
            index.set_corpus_fingerprint(fingerprint);
        }

        log::info!(
            "Loaded index snapshot from {} ({} records, model {})",
            path.display(),
            index.len(),
            index.model_id()
        );
        Ok(index)
    }
}

/// Read snapshot metadata without building an index
pub async fn read_snapshot_info(path: impl AsRef<Path>) -> Result<SnapshotInfo> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    let header: PersistedHeader = serde_json::from_slice(&bytes)?;
    Ok(SnapshotInfo {
        schema_version: header.schema_version,
        model_id: header.model_id,
        dimension: header.dimension,
        created_at: header.created_at,
        corpus_fingerprint: header.corpus_fingerprint,
        records: header.records.len(),
    })
}

impl SnapshotInfo {
    /// Whether an index described by this header can serve `spec`
    pub fn check(&self, spec: &IndexSpec) -> Result<()> {
        check_compatible(self.schema_version, &self.model_id, self.dimension, spec)
    }
}

fn check_compatible(
    schema_version: u32,
    model_id: &str,
    dimension: usize,
    spec: &IndexSpec,
) -> Result<()> {
    if schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(IndexError::IncompatibleSnapshot(format!(
            "unsupported schema_version {schema_version} (expected {SNAPSHOT_SCHEMA_VERSION})"
        )));
    }
    if model_id != spec.model_id {
        return Err(IndexError::IncompatibleSnapshot(format!(
            "built with model '{model_id}', configured model is '{}'",
            spec.model_id
        )));
    }
    if dimension != spec.dimension {
        return Err(IndexError::IncompatibleSnapshot(format!(
            "built with dimension {dimension}, configured dimension is {}",
            spec.dimension
        )));
    }
    Ok(())
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
