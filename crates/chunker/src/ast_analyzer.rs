use crate::code::{signature, CodeItem};
use crate::error::{ChunkError, Result};
use crate::language::Language;
use crate::text::Span;
use tree_sitter::{Node, Parser};

/// Finds declaration boundaries with a tree-sitter parse
pub struct AstAnalyzer {
    parser: Parser,
    language: Language,
}

impl AstAnalyzer {
    /// Create new AST analyzer for a language
    pub fn new(language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ChunkError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser, language })
    }

    /// Top-level declarations with their leading comments/attributes, members of
    /// containers (impl blocks, classes, traits, modules) nested one level deep.
    pub(crate) fn items(&mut self, content: &str) -> Result<Vec<CodeItem>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ChunkError::tree_sitter("Failed to parse source code"))?;

        Ok(self.collect_items(content, tree.root_node(), true))
    }

    fn collect_items(&self, content: &str, parent: Node, top_level: bool) -> Vec<CodeItem> {
        let mut items = Vec::new();
        // Start and end of a run of comments/attributes directly above the next item
        let mut leading: Option<(usize, usize)> = None;

        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            let kind = child.kind();

            if is_leading_trivia(kind) {
                leading = match leading {
                    Some((start, end)) if attached(content, end, child.start_byte()) => {
                        Some((start, child.end_byte()))
                    }
                    _ => Some((child.start_byte(), child.end_byte())),
                };
                continue;
            }

            if self.is_item(kind) {
                let start = match leading {
                    Some((start, end)) if attached(content, end, child.start_byte()) => start,
                    _ => child.start_byte(),
                };
                let members = if top_level {
                    self.container_body(child)
                        .map(|body| self.collect_items(content, body, false))
                        .unwrap_or_default()
                } else {
                    Vec::new()
                };
                items.push(CodeItem {
                    span: Span::new(start, child.end_byte()),
                    signature: signature(content, signature_start(child), self.language.family()),
                    members,
                });
            }

            leading = None;
        }

        items
    }

    fn is_item(&self, kind: &str) -> bool {
        match self.language {
            Language::Rust => matches!(
                kind,
                "function_item"
                    | "function_signature_item"
                    | "struct_item"
                    | "enum_item"
                    | "impl_item"
                    | "trait_item"
                    | "mod_item"
                    | "const_item"
                    | "static_item"
                    | "type_item"
                    | "macro_definition"
                    | "union_item"
            ),
            Language::Python => matches!(
                kind,
                "function_definition" | "class_definition" | "decorated_definition"
            ),
            Language::JavaScript | Language::TypeScript => matches!(
                kind,
                "function_declaration"
                    | "generator_function_declaration"
                    | "class_declaration"
                    | "abstract_class_declaration"
                    | "interface_declaration"
                    | "enum_declaration"
                    | "type_alias_declaration"
                    | "export_statement"
                    | "lexical_declaration"
                    | "method_definition"
                    | "public_field_definition"
                    | "field_definition"
            ),
            _ => false,
        }
    }

    /// Body node holding the members of a container declaration
    fn container_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let node = signature_node(node);
        let is_container = match self.language {
            Language::Rust => matches!(node.kind(), "impl_item" | "trait_item" | "mod_item"),
            Language::Python => node.kind() == "class_definition",
            Language::JavaScript | Language::TypeScript => {
                matches!(node.kind(), "class_declaration" | "abstract_class_declaration")
            }
            _ => false,
        };
        if !is_container {
            return None;
        }
        node.child_by_field_name("body")
    }
}

/// Signatures skip decorators but keep `export`
fn signature_start(node: Node) -> usize {
    match node.kind() {
        "decorated_definition" => node
            .child_by_field_name("definition")
            .map_or(node.start_byte(), |def| def.start_byte()),
        _ => node.start_byte(),
    }
}

/// The declaration a wrapper node stands for (decorators, `export`)
fn signature_node(node: Node) -> Node {
    match node.kind() {
        "decorated_definition" => node.child_by_field_name("definition").unwrap_or(node),
        "export_statement" => node.child_by_field_name("declaration").unwrap_or(node),
        _ => node,
    }
}

fn is_leading_trivia(kind: &str) -> bool {
    matches!(
        kind,
        "line_comment" | "block_comment" | "comment" | "attribute_item" | "decorator"
    )
}

/// Whether a comment ending at `end` belongs to a node starting at `next_start`
/// (no blank line between them).
fn attached(content: &str, end: usize, next_start: usize) -> bool {
    next_start >= end && content[end..next_start].matches('\n').count() <= 1
}
