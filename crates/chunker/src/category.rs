use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declared file-type category of a document; selects the chunking strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Markdown-like prose with headings
    Prose,
    /// Source code
    Code,
    /// Delimited rows (csv, tsv)
    Tabular,
    /// Configuration and structured data files
    Config,
    /// Anything else, including unknown extensions
    Other,
}

/// One of the four chunking strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Heading sections, sub-split on paragraphs
    Sections,
    /// Function/class boundaries with sliding fallback
    Structure,
    /// Row groups with the header row repeated
    RowGroups,
    /// Blank-line paragraphs merged up to the size limit
    Paragraphs,
}

impl FileCategory {
    /// Classify a file extension. Unknown extensions map to [`FileCategory::Other`].
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "md" | "mdx" | "markdown" | "mkd" => Self::Prose,
            "csv" | "tsv" | "tab" => Self::Tabular,
            "yaml" | "yml" | "toml" | "json" | "jsonc" | "ini" | "cfg" | "conf" | "properties"
            | "env" | "xml" | "plist" | "hcl" | "tf" | "tfvars" => Self::Config,
            other if Language::from_extension(other) != Language::Unknown => Self::Code,
            _ => Self::Other,
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    /// Strategy used for documents of this category
    pub const fn strategy(self) -> ChunkStrategy {
        match self {
            Self::Prose => ChunkStrategy::Sections,
            Self::Code => ChunkStrategy::Structure,
            Self::Tabular => ChunkStrategy::RowGroups,
            Self::Config | Self::Other => ChunkStrategy::Paragraphs,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Code => "code",
            Self::Tabular => "tabular",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
