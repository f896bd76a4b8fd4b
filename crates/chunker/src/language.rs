use crate::error::{ChunkError, Result};
use std::path::Path;

/// Programming language of a code document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Scala,
    Php,
    Lua,
    Shell,
    Unknown,
}

/// How structural boundaries are recognised when no AST is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageFamily {
    /// Blocks delimited by `{ }` (C, Java, Go, ...)
    Brace,
    /// Blocks delimited by indentation or `end` keywords (Python, Ruby, Lua)
    Indent,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "scala" | "sc" => Language::Scala,
            "php" => Language::Php,
            "lua" => Language::Lua,
            "sh" | "bash" | "zsh" => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Php => "php",
            Language::Lua => "lua",
            Language::Shell => "shell",
            Language::Unknown => "unknown",
        }
    }

    /// Check if this language is supported for AST parsing
    pub fn supports_ast(self) -> bool {
        matches!(
            self,
            Language::Rust | Language::Python | Language::JavaScript | Language::TypeScript
        )
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            _ => Err(ChunkError::tree_sitter(format!(
                "no grammar bundled for {}",
                self.as_str()
            ))),
        }
    }

    /// Boundary detection family for the heuristic scanner
    pub fn family(self) -> LanguageFamily {
        match self {
            Language::Python | Language::Ruby | Language::Lua => LanguageFamily::Indent,
            _ => LanguageFamily::Brace,
        }
    }

    /// Get typical comment prefixes for this language
    pub fn comment_prefixes(self) -> &'static [&'static str] {
        match self {
            Language::Rust
            | Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::Swift
            | Language::Kotlin
            | Language::Scala => &["//", "/*", "*", "*/"],
            Language::Php => &["//", "/*", "*", "*/", "#"],
            Language::Python | Language::Ruby | Language::Shell => &["#"],
            Language::Lua => &["--"],
            Language::Unknown => &["//", "#"],
        }
    }

    /// Prefixes of annotation lines that belong to the declaration below them
    pub fn annotation_prefixes(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["#["],
            Language::Python | Language::Java | Language::Kotlin | Language::Scala => &["@"],
            Language::TypeScript | Language::JavaScript => &["@"],
            Language::CSharp => &["["],
            Language::Swift => &["@"],
            Language::Php => &["#["],
            _ => &[],
        }
    }
}
