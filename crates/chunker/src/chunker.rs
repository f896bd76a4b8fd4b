use crate::category::{ChunkStrategy, FileCategory};
use crate::code::chunk_code;
use crate::config::ChunkerConfig;
use crate::error::{ChunkError, Result};
use crate::language::Language;
use crate::markdown::chunk_sections;
use crate::strategy::{chunk_paragraphs, Piece};
use crate::tabular::{chunk_rows, Dialect};
use crate::text::LineIndex;
use crate::types::{Chunk, Document};
use std::path::Path;

/// Bytes inspected for NUL when deciding whether content is binary
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Main chunker interface for processing documents
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with validated configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkError::invalid_config)?;
        Ok(Self { config })
    }

    /// Chunk a document. Output is deterministic for identical bytes and configuration.
    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let content = decode(&document.path, &document.bytes)?;
        Ok(self.chunk_text(content, &document.path, document.category))
    }

    /// Chunk a string, deriving the category from the path extension
    pub fn chunk_str(&self, content: &str, path: &str) -> Result<Vec<Chunk>> {
        Ok(self.chunk_text(content, path, FileCategory::from_path(path)))
    }

    /// Chunk a file from disk; chunk paths use the path as given
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let document = Document::from_path(path.to_string_lossy().replace('\\', "/"), bytes);
        self.chunk(&document)
    }

    fn chunk_text(&self, content: &str, path: &str, category: FileCategory) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let max = self.config.max_chunk_size;
        let language = match category {
            FileCategory::Code => Some(Language::from_path(path)),
            _ => None,
        };

        let pieces = match category.strategy() {
            ChunkStrategy::Sections => chunk_sections(content, max),
            ChunkStrategy::Structure => {
                chunk_code(content, language.unwrap_or(Language::Unknown), &self.config)
            }
            ChunkStrategy::RowGroups => chunk_rows(
                content,
                Dialect::from_path(path),
                max,
                self.config.rows_per_chunk,
            ),
            ChunkStrategy::Paragraphs => chunk_paragraphs(content, max),
        };

        let chunks = assemble(content, path, category, language, pieces);
        log::debug!(
            "Chunked {path} ({category}, {} bytes) into {} chunks",
            content.len(),
            chunks.len()
        );
        chunks
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

/// Reject binary and non-UTF-8 content
fn decode<'a>(path: &str, bytes: &'a [u8]) -> Result<&'a str> {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sniff.contains(&0) {
        return Err(ChunkError::unreadable(path, "binary content"));
    }
    std::str::from_utf8(bytes).map_err(|e| {
        ChunkError::unreadable(
            path,
            format!("invalid UTF-8 at byte {}", e.valid_up_to()),
        )
    })
}

fn assemble(
    content: &str,
    path: &str,
    category: FileCategory,
    language: Option<Language>,
    pieces: Vec<Piece>,
) -> Vec<Chunk> {
    let lines = LineIndex::new(content);
    let language = language
        .filter(|lang| *lang != Language::Unknown)
        .map(|lang| lang.as_str().to_string());

    pieces
        .into_iter()
        .filter(|piece| piece.span.start < piece.span.end)
        .enumerate()
        .map(|(seq, piece)| {
            let (start_line, end_line) = lines.lines_of(piece.span);
            Chunk {
                id: format!("{path}:{seq}"),
                source_path: path.to_string(),
                file_type: category,
                language: language.clone(),
                text: piece.text(content),
                header_context: piece.header_context,
                code_context: piece.code_context,
                start_offset: piece.span.start,
                end_offset: piece.span.end,
                start_line,
                end_line,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUST_CODE: &str = r#"
use std::collections::HashMap;

/// Main function
fn main() {
    println!("Hello, world!");
}

struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
"#;

    #[test]
    fn test_chunk_str() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_str(RUST_CODE, "src/main.rs").unwrap();
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].id, "src/main.rs:0");
        assert!(chunks.iter().all(|c| c.language.as_deref() == Some("rust")));
        assert!(chunks.iter().all(|c| c.file_type == FileCategory::Code));
    }

    #[test]
    fn test_chunk_empty_content() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_str("", "a.md").unwrap().is_empty());
        assert!(chunker.chunk_str("  \n\t\n", "a.rs").unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_documents() {
        let chunker = Chunker::default();

        let binary = Document::new("img.png", FileCategory::Other, vec![0x89, b'P', 0, 1, 2]);
        let err = chunker.chunk(&binary).unwrap_err();
        assert!(matches!(err, ChunkError::Unreadable { .. }));
        assert!(err.is_document_local());

        let latin1 = Document::from_path("notes.txt", vec![b'c', b'a', b'f', 0xe9]);
        assert!(matches!(
            chunker.chunk(&latin1),
            Err(ChunkError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ChunkerConfig {
            code_overlap: 0,
            ..ChunkerConfig::default()
        };
        assert!(matches!(
            Chunker::new(config),
            Err(ChunkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_offsets_and_lines_match_source() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_size: 120,
            min_chunk_size: 16,
            code_overlap: 30,
            rows_per_chunk: 20,
        })
        .unwrap();
        let chunks = chunker.chunk_str(RUST_CODE, "src/main.rs").unwrap();
        for chunk in &chunks {
            let slice = &RUST_CODE[chunk.start_offset..chunk.end_offset];
            assert!(chunk.text.ends_with(slice));
            let first_line = RUST_CODE[..chunk.start_offset].matches('\n').count() + 1;
            assert_eq!(chunk.start_line, first_line);
        }
    }

    #[test]
    fn test_small_items_merge_and_keep_context() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_str(RUST_CODE, "src/main.rs").unwrap();
        // The import, `main` and `Point` are each below the minimum and get merged.
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("use std::collections::HashMap;"));
        assert!(chunks[0].text.ends_with("y: i32,\n}"));
        assert_eq!(chunks[0].code_context, None);
        assert_eq!(chunks[1].code_context.as_deref(), Some("impl Point"));
    }

    #[test]
    fn test_csv_document() {
        let chunker = Chunker::new(ChunkerConfig {
            rows_per_chunk: 1,
            ..ChunkerConfig::default()
        })
        .unwrap();
        let chunks = chunker.chunk_str("a,b\n1,2\n3,4\n", "data.csv").unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a,b\n1,2", "a,b\n3,4"]);
        assert_eq!(chunks[1].start_offset, 8);
        assert_eq!(chunks[1].start_line, 3);
    }
}
