use crate::ast_analyzer::AstAnalyzer;
use crate::config::ChunkerConfig;
use crate::language::{Language, LanguageFamily};
use crate::strategy::Piece;
use crate::structure;
use crate::text::{forced_split, line_spans, tail_overlap, Span};

const MAX_SIGNATURE_CHARS: usize = 200;
const CONTEXT_SEPARATOR: &str = " > ";

/// A declaration found in source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeItem {
    /// Declaration including its leading comments/attributes
    pub span: Span,
    /// Header of the declaration, whitespace collapsed
    pub signature: String,
    /// Direct members when the item is a container (impl, class, trait, module)
    pub members: Vec<CodeItem>,
}

/// A run of source with the signature that encloses it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unit {
    span: Span,
    context: Option<String>,
}

/// Extract a declaration header starting at byte `start`.
///
/// Brace languages stop at the first `{` or `;` outside parentheses and brackets; indentation
/// languages stop at the end of the first line with balanced parentheses and drop a trailing
/// `:`.
pub(crate) fn signature(src: &str, start: usize, family: LanguageFamily) -> String {
    let rest = &src[start..];
    let mut depth: i32 = 0;
    let mut end = rest.len();

    for (idx, ch) in rest.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '{' | ';' if depth <= 0 && family == LanguageFamily::Brace => {
                end = idx;
                break;
            }
            '\n' if depth <= 0 && family == LanguageFamily::Indent => {
                end = idx;
                break;
            }
            _ => {}
        }
        if idx > MAX_SIGNATURE_CHARS * 4 {
            end = idx;
            break;
        }
    }

    let mut collapsed = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    if family == LanguageFamily::Indent {
        while collapsed.ends_with(':') {
            collapsed.pop();
        }
    }
    if let Some((cut, _)) = collapsed.char_indices().nth(MAX_SIGNATURE_CHARS) {
        collapsed.truncate(cut);
    }
    collapsed.trim_end().to_string()
}

/// Structure strategy for one code document.
pub(crate) fn chunk_code(src: &str, language: Language, config: &ChunkerConfig) -> Vec<Piece> {
    let items = find_items(src, language);
    let units = build_units(src, &items, config.max_chunk_size);
    let units = pack_small(units, config.min_chunk_size, config.max_chunk_size);

    let mut pieces = Vec::with_capacity(units.len());
    for unit in units {
        if unit.span.len() <= config.max_chunk_size {
            pieces.push(Piece::new(unit.span).with_code_context(unit.context));
        } else {
            pieces.extend(sliding_split(src, &unit, config));
        }
    }
    pieces
}

fn find_items(src: &str, language: Language) -> Vec<CodeItem> {
    if language.supports_ast() {
        match AstAnalyzer::new(language).and_then(|mut analyzer| analyzer.items(src)) {
            Ok(items) => return items,
            Err(e) => {
                log::warn!("AST analysis failed, falling back to heuristic boundaries: {e}");
            }
        }
    }
    structure::items(src, language)
}

/// Turn declarations into units: items that fit stay whole, oversized containers are opened
/// into their members, and the text between items becomes context-free units.
fn build_units(src: &str, items: &[CodeItem], max: usize) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut cursor = 0;

    for item in items {
        if item.span.start < cursor {
            continue;
        }
        push_unit(src, &mut units, Span::new(cursor, item.span.start), None);

        if item.span.len() > max && !item.members.is_empty() {
            let outer = Some(item.signature.clone());
            let mut inner = item.span.start;
            for member in &item.members {
                if member.span.start < inner {
                    continue;
                }
                push_unit(src, &mut units, Span::new(inner, member.span.start), outer.clone());
                let context = if item.signature.is_empty() {
                    member.signature.clone()
                } else {
                    format!("{}{CONTEXT_SEPARATOR}{}", item.signature, member.signature)
                };
                push_unit(src, &mut units, member.span, Some(context));
                inner = member.span.end;
            }
            push_unit(src, &mut units, Span::new(inner, item.span.end), outer);
        } else {
            push_unit(src, &mut units, item.span, Some(item.signature.clone()));
        }
        cursor = item.span.end;
    }
    push_unit(src, &mut units, Span::new(cursor, src.len()), None);

    units
}

fn push_unit(src: &str, units: &mut Vec<Unit>, span: Span, context: Option<String>) {
    if span.start >= span.end {
        return;
    }
    if let Some(span) = span.trimmed(src) {
        units.push(Unit {
            span,
            context: context.filter(|c| !c.is_empty()),
        });
    }
}

/// Merge a unit into its predecessor when either is shorter than `min` and the merged span
/// still fits in `max`.
fn pack_small(units: Vec<Unit>, min: usize, max: usize) -> Vec<Unit> {
    let mut out: Vec<Unit> = Vec::with_capacity(units.len());

    for unit in units {
        if let Some(prev) = out.last_mut() {
            let small = prev.span.len() < min || unit.span.len() < min;
            if small && unit.span.end - prev.span.start <= max {
                prev.context = merged_context(prev.context.as_deref(), unit.context.as_deref());
                prev.span = prev.span.join(unit.span);
                continue;
            }
        }
        out.push(unit);
    }

    out
}

/// Context of two merged units: the more specific one when one path encloses the other,
/// otherwise their shared enclosing path.
fn merged_context(a: Option<&str>, b: Option<&str>) -> Option<String> {
    match (a, b) {
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
        (Some(a), Some(b)) => {
            let a_parts: Vec<&str> = a.split(CONTEXT_SEPARATOR).collect();
            let b_parts: Vec<&str> = b.split(CONTEXT_SEPARATOR).collect();
            let shared = a_parts
                .iter()
                .zip(&b_parts)
                .take_while(|(x, y)| x == y)
                .count();
            if shared == a_parts.len() {
                Some(b.to_string())
            } else if shared == b_parts.len() {
                Some(a.to_string())
            } else if shared == 0 {
                None
            } else {
                Some(a_parts[..shared].join(CONTEXT_SEPARATOR))
            }
        }
    }
}

/// Split an oversized unit on line boundaries. Every piece after the first starts with the
/// tail of the previous piece (at most `code_overlap` bytes) followed by a newline.
fn sliding_split(src: &str, unit: &Unit, config: &ChunkerConfig) -> Vec<Piece> {
    let max = config.max_chunk_size;
    let overlap = config.code_overlap;
    let body_budget = max - overlap - 1;

    let lines: Vec<Span> = line_spans(src, unit.span)
        .into_iter()
        .flat_map(|line| {
            if line.len() <= body_budget {
                vec![line]
            } else {
                forced_split(src, line, body_budget)
            }
        })
        .collect();

    // First window may use the whole budget; later ones leave room for the carried tail.
    let mut windows: Vec<Span> = Vec::new();
    for line in lines {
        let limit = if windows.len() <= 1 { max } else { body_budget };
        match windows.last_mut() {
            Some(last) if line.end - last.start <= limit => last.end = line.end,
            _ => windows.push(line),
        }
    }

    log::debug!(
        "Unit '{}' ({} bytes) split into {} windows",
        unit.context.as_deref().unwrap_or("<top level>"),
        unit.span.len(),
        windows.len()
    );

    let mut pieces = Vec::with_capacity(windows.len());
    let mut previous: Option<Span> = None;
    for window in windows {
        let prefix = previous.map(|prev| format!("{}\n", tail_overlap(prev.slice(src), overlap)));
        pieces.push(
            Piece::new(window)
                .with_prefix(prefix)
                .with_code_context(unit.context.clone()),
        );
        previous = Some(window);
    }
    pieces
}
