use docqa_chunker::{Chunk, ChunkingStats};
use docqa_indexer::{IndexStats, Staleness};
use docqa_vector_store::{ScoredChunk, SnapshotInfo};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub snapshot_path: String,
    /// False when a compatible snapshot was kept as is
    pub rebuilt: bool,
    pub model_id: String,
    pub dimension: usize,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HitReport {
    pub rank: usize,
    pub chunk_id: String,
    pub source_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header_context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,
    pub preview: String,
}

impl HitReport {
    #[must_use]
    pub fn new(rank: usize, hit: &ScoredChunk, preview_chars: usize) -> Self {
        let chunk = &hit.chunk;
        Self {
            rank,
            chunk_id: chunk.id.clone(),
            source_path: chunk.source_path.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            score: hit.score,
            header_context: chunk.header_context.clone(),
            code_context: chunk.code_context.clone(),
            preview: chunk.preview(preview_chars),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub k: usize,
    pub hits: Vec<HitReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    #[serde(flatten)]
    pub info: SnapshotInfo,
    /// Whether the configured model and dimension can load this snapshot
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness: Option<Staleness>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    pub name: String,
    pub version: String,
    pub embedding_mode: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub docs_dir: String,
    pub snapshot_path: String,
    pub snapshot: Option<SnapshotReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    pub path: String,
    pub stats: ChunkingStats,
    pub chunks: Vec<Chunk>,
}

pub fn render_index(report: &IndexReport) -> String {
    let mut out = String::new();
    if report.rebuilt {
        let _ = writeln!(out, "Index built: {}", report.snapshot_path);
    } else {
        let _ = writeln!(out, "Index up to date: {}", report.snapshot_path);
    }
    let _ = writeln!(
        out,
        "  Model: {} (dim {}), {} chunks",
        report.model_id, report.dimension, report.records
    );

    if let Some(stats) = &report.stats {
        let _ = writeln!(
            out,
            "  Documents: {} indexed, {} skipped, {} lines, {} ms",
            stats.documents, stats.skipped, stats.total_lines, stats.time_ms
        );
        if !stats.categories.is_empty() {
            let categories: Vec<String> = stats
                .categories
                .iter()
                .map(|(name, count)| format!("{name}={count}"))
                .collect();
            let _ = writeln!(out, "  Categories: {}", categories.join(", "));
        }
        if !stats.languages.is_empty() {
            let languages: Vec<String> = stats
                .languages
                .iter()
                .map(|(name, count)| format!("{name}={count}"))
                .collect();
            let _ = writeln!(out, "  Languages: {}", languages.join(", "));
        }
        for error in &stats.errors {
            let _ = writeln!(out, "  Skipped {error}");
        }
    }

    out.trim_end().to_string()
}

pub fn render_search(report: &SearchReport) -> String {
    if report.hits.is_empty() {
        return format!("No results for {:?}", report.query);
    }

    let mut out = format!("Top {} results for {:?}:\n", report.hits.len(), report.query);
    for hit in &report.hits {
        let _ = writeln!(
            out,
            "\n{}. {} (score: {:.3})",
            hit.rank, hit.source_path, hit.score
        );
        let _ = writeln!(out, "   Lines: {}-{}", hit.start_line, hit.end_line);
        if !hit.header_context.is_empty() {
            let _ = writeln!(out, "   Section: {}", hit.header_context.join(" > "));
        }
        if let Some(context) = &hit.code_context {
            let _ = writeln!(out, "   Context: {context}");
        }
        for line in hit.preview.lines() {
            let _ = writeln!(out, "   | {line}");
        }
    }

    out.trim_end().to_string()
}

pub fn render_info(report: &InfoReport) -> String {
    let mut out = format!("{} {}\n", report.name, report.version);
    let _ = writeln!(
        out,
        "Embeddings: {} ({}, dim {})",
        report.embedding_model, report.embedding_mode, report.dimension
    );
    let _ = writeln!(out, "Docs: {}", report.docs_dir);
    let _ = writeln!(out, "Snapshot: {}", report.snapshot_path);

    match &report.snapshot {
        None => {
            let _ = writeln!(out, "  not built yet (run `docqa index`)");
        }
        Some(snapshot) => {
            let info = &snapshot.info;
            let _ = writeln!(
                out,
                "  {} chunks, model {} (dim {}), schema v{}, built at {}",
                info.records, info.model_id, info.dimension, info.schema_version, info.created_at
            );
            if !snapshot.compatible {
                let _ = writeln!(
                    out,
                    "  incompatible with the configured model; next index run rebuilds it"
                );
            }
            match &snapshot.staleness {
                Some(staleness) if staleness.stale => {
                    let _ = writeln!(out, "  stale: documents changed since the last build");
                }
                Some(_) => {
                    let _ = writeln!(out, "  fresh");
                }
                None => {
                    let _ = writeln!(out, "  docs directory not found; freshness unknown");
                }
            }
        }
    }

    out.trim_end().to_string()
}

pub fn render_chunks(report: &ChunkReport, preview_chars: usize) -> String {
    let stats = &report.stats;
    let mut out = format!(
        "{}: {} chunks, {} bytes (max {}, avg {})\n",
        report.path,
        stats.total_chunks,
        stats.total_bytes,
        stats.max_chunk_bytes,
        stats.average_bytes()
    );
    for chunk in &report.chunks {
        let _ = writeln!(
            out,
            "\n[{}] lines {}-{}, bytes {}..{}",
            chunk.id, chunk.start_line, chunk.end_line, chunk.start_offset, chunk.end_offset
        );
        if !chunk.header_context.is_empty() {
            let _ = writeln!(out, "   Section: {}", chunk.header_path());
        }
        if let Some(context) = &chunk.code_context {
            let _ = writeln!(out, "   Context: {context}");
        }
        for line in chunk.preview(preview_chars).lines() {
            let _ = writeln!(out, "   | {line}");
        }
    }
    out.trim_end().to_string()
}
