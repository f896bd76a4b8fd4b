use docqa_chunker::FileCategory;
use ignore::{DirEntry, WalkBuilder};
use std::path::{Component, Path, PathBuf};

/// Documents larger than this are skipped
pub const MAX_DOCUMENT_BYTES: u64 = 1_048_576;

/// Directory names never descended into, compared case-insensitively
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "__pycache__",
    "vector_db",
];

/// Generated files that look like documents but carry no prose
const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "Cargo.lock",
    "poetry.lock",
];

/// Plain-text formats chunked as paragraphs
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "rst", "adoc"];

/// Extensionless files worth indexing
const BARE_DOCUMENTS: &[&str] = &["README", "CHANGELOG", "LICENSE", "Makefile", "Dockerfile"];

/// Collects indexable documents under a docs directory
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Documents under the root, `.gitignore` aware, sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(move |entry| !in_skipped_dir(entry.path(), &root))
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    None
                }
            })
            .filter(accept)
            .map(DirEntry::into_path)
            .collect();

        files.sort();
        log::info!("Found {} documents under {}", files.len(), self.root.display());
        files
    }

    /// Path relative to the scan root with `/` separators
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let normalized = relative.to_string_lossy();
        if normalized.contains('\\') {
            normalized.replace('\\', "/")
        } else {
            normalized.into_owned()
        }
    }
}

fn accept(entry: &DirEntry) -> bool {
    if !entry.file_type().is_some_and(|t| t.is_file()) {
        return false;
    }

    let path = entry.path();
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if LOCKFILES.iter().any(|lock| name.eq_ignore_ascii_case(lock)) {
        log::debug!("Skipping lockfile {}", path.display());
        return false;
    }
    if !is_document(path, name) {
        return false;
    }

    match entry.metadata() {
        Ok(meta) if meta.len() > MAX_DOCUMENT_BYTES => {
            log::debug!(
                "Skipping large file {} ({} bytes > {MAX_DOCUMENT_BYTES})",
                path.display(),
                meta.len()
            );
            false
        }
        _ => true,
    }
}

fn is_document(path: &Path, name: &str) -> bool {
    if FileCategory::from_path(path) != FileCategory::Other {
        return true;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => TEXT_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        None => BARE_DOCUMENTS
            .iter()
            .any(|known| name.eq_ignore_ascii_case(known)),
    }
}

fn in_skipped_dir(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            SKIPPED_DIRS.iter().any(|dir| name.eq_ignore_ascii_case(dir))
        }
        _ => false,
    })
}
