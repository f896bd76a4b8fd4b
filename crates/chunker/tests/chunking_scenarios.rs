use docqa_chunker::{Chunk, ChunkError, Chunker, ChunkerConfig, Document, FileCategory};
use pretty_assertions::assert_eq;

fn chunker() -> Chunker {
    Chunker::new(ChunkerConfig::default()).expect("default config is valid")
}

fn headers(chunks: &[Chunk]) -> Vec<Vec<&str>> {
    chunks
        .iter()
        .map(|c| c.header_context.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn three_section_markdown_yields_three_chunks() {
    let doc = "# A\n\nAlpha section text.\n\n## B\n\nBeta belongs under A.\n\n# C\n\nGamma stands alone.\n";
    let chunks = chunker()
        .chunk(&Document::from_path("guide.md", doc))
        .expect("markdown chunks");

    assert_eq!(chunks.len(), 3);
    assert_eq!(headers(&chunks), vec![vec!["A"], vec!["A", "B"], vec!["C"]]);
    assert_eq!(chunks[1].text, "Beta belongs under A.");
    assert_eq!(
        chunks.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["guide.md:0", "guide.md:1", "guide.md:2"]
    );
    assert_eq!(chunks[2].start_line, 11);
}

#[test]
fn chunking_is_idempotent() {
    let doc = include_str!("../src/markdown.rs");
    let first = chunker().chunk_str(doc, "src/markdown.rs").unwrap();
    let second = chunker().chunk_str(doc, "src/markdown.rs").unwrap();
    assert_eq!(first, second);
    assert!(first.len() > 1);
}

#[test]
fn real_source_file_chunks_stay_within_limits() {
    let code = include_str!("../src/structure.rs");
    let config = ChunkerConfig {
        max_chunk_size: 1200,
        ..ChunkerConfig::default()
    };
    let chunks = Chunker::new(config).unwrap().chunk_str(code, "structure.rs").unwrap();

    assert!(chunks.iter().all(|c| c.text.len() <= 1200));
    assert!(chunks
        .iter()
        .any(|c| c.code_context.as_deref() == Some("fn is_brace_declaration(line: &str) -> bool")));
    assert!(chunks
        .iter()
        .any(|c| c.code_context.as_deref().is_some_and(|ctx| ctx.starts_with("impl<'a> Scanner<'a> > fn"))));
}

#[test]
fn oversized_paragraph_without_breaks_is_forced_apart() {
    let blob = "ü".repeat(3000); // 6000 bytes, no whitespace at all
    let chunks = chunker().chunk_str(&blob, "blob.txt").unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.text.len() <= 4000));
    assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), blob);
}

#[test]
fn unknown_extension_uses_paragraphs() {
    let chunks = chunker()
        .chunk_str("first paragraph\n\nsecond paragraph\n", "README")
        .unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].file_type, FileCategory::Other);
    assert!(chunks[0].header_context.is_empty());
    assert_eq!(chunks[0].code_context, None);
}

#[test]
fn csv_chunks_repeat_header() {
    let mut csv = String::from("id,name,notes\n");
    for i in 0..45 {
        csv.push_str(&format!("{i},user{i},\"line one\nline two\"\n"));
    }
    let chunks = chunker().chunk_str(&csv, "users.csv").unwrap();
    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert!(chunk.text.starts_with("id,name,notes\n"));
    }
    assert!(chunks[2].text.contains("44,user44"));
}

#[test]
fn file_on_disk_is_chunked_and_binary_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("settings.yaml");
    std::fs::write(&text_path, "server:\n  port: 8080\n\nlogging:\n  level: info\n").unwrap();
    let chunks = chunker().chunk_file(&text_path).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].file_type, FileCategory::Config);

    let bin_path = dir.path().join("blob.md");
    std::fs::write(&bin_path, [b'#', b' ', 0u8, 0xff]).unwrap();
    let err = chunker().chunk_file(&bin_path).unwrap_err();
    assert!(matches!(err, ChunkError::Unreadable { .. }));
}
