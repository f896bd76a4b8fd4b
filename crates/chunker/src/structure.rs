//! Declaration boundaries for languages without a bundled grammar.
//!
//! Brace languages are scanned with a small lexer that tracks `{}` depth outside strings and
//! comments; indentation languages use leading whitespace plus `end` keywords.

use crate::code::{signature, CodeItem};
use crate::language::{Language, LanguageFamily};
use crate::text::Span;
use once_cell::sync::Lazy;
use regex::Regex;

static BRACE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:export|default|public|private|protected|internal|static|final|abstract|sealed|open|override|async|inline|virtual|extern|unsafe|partial|suspend|data|fileprivate|mutating|pub(?:\([^)]*\))?)\s+)*(?:class|struct|interface|enum|trait|impl|fn|func|function|fun|object|record|namespace|protocol|extension|union|type|mod)\b",
    )
    .expect("valid declaration regex")
});

static C_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][\w<>\[\],.:*&?~\s]*?)\b([A-Za-z_~]\w*)\s*\([^;{}]*\)[^;{}]*\{?\s*$")
        .expect("valid function regex")
});

static INDENT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:async\s+def|def|class|module|function|local\s+function)\b")
        .expect("valid declaration regex")
});

static CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:class|struct|interface|impl|trait|object|namespace|extension|protocol|record|enum|mod|module)\b",
    )
    .expect("valid container regex")
});

static END_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^end\b").expect("valid end regex"));

const CONTROL_WORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "else", "catch", "do", "sizeof", "new", "throw",
    "case", "foreach", "using", "lock", "synchronized", "typeof", "await", "yield", "elif",
    "with", "defer", "go", "select",
];

/// Lines that open a declaration within this many lines without `{` are not declarations
const MAX_HEADER_LINES: usize = 6;

struct Line<'a> {
    start: usize,
    end: usize,
    text: &'a str,
    indent: usize,
    depth_before: usize,
    depth_after: usize,
    opens: bool,
}

impl Line<'_> {
    fn trimmed(&self) -> &str {
        self.text.trim()
    }

    fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

struct Scanner<'a> {
    src: &'a str,
    language: Language,
    lines: Vec<Line<'a>>,
}

/// Heuristic declaration boundaries for `src`
pub(crate) fn items(src: &str, language: Language) -> Vec<CodeItem> {
    let scanner = Scanner::new(src, language);
    let count = scanner.lines.len();
    match language.family() {
        LanguageFamily::Brace => scanner.brace_items(0, count, 0, false),
        LanguageFamily::Indent => scanner.indent_items(0, count, 0, false),
    }
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, language: Language) -> Self {
        let hash_comments = language.comment_prefixes().contains(&"#");
        let mut lines = Vec::new();
        let mut offset = 0;
        let mut depth = 0usize;
        let mut in_block_comment = false;

        for raw in src.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();
            let text = raw.trim_end_matches(['\n', '\r']);
            let indent = text
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(|c| if c == '\t' { 4 } else { 1 })
                .sum();

            let depth_before = depth;
            let mut opens = false;
            let mut chars = text.chars().peekable();
            while let Some(ch) = chars.next() {
                if in_block_comment {
                    if ch == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        in_block_comment = false;
                    }
                    continue;
                }
                match ch {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        in_block_comment = true;
                    }
                    '#' if hash_comments => break,
                    '"' | '\'' | '`' => {
                        let mut escaped = false;
                        for inner in chars.by_ref() {
                            if escaped {
                                escaped = false;
                            } else if inner == '\\' {
                                escaped = true;
                            } else if inner == ch {
                                break;
                            }
                        }
                    }
                    '{' => {
                        depth += 1;
                        opens = true;
                    }
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }

            lines.push(Line {
                start,
                end: start + text.len(),
                text,
                indent,
                depth_before,
                depth_after: depth,
                opens,
            });
        }

        Self {
            src,
            language,
            lines,
        }
    }

    fn brace_items(&self, lo: usize, hi: usize, depth: usize, nested: bool) -> Vec<CodeItem> {
        let mut items = Vec::new();
        let mut floor = lo;
        let mut i = lo;

        while i < hi {
            let line = &self.lines[i];
            if line.depth_before != depth || !is_brace_declaration(line.trimmed()) {
                i += 1;
                continue;
            }
            let Some(end) = self.brace_end(i, hi, depth) else {
                i += 1;
                continue;
            };

            let members = if nested || end <= i + 1 || !CONTAINER.is_match(line.trimmed()) {
                Vec::new()
            } else {
                self.brace_items(i + 1, end, depth + 1, true)
            };
            items.push(self.item(self.leading_start(i, floor), i, end, members));
            floor = end + 1;
            i = end + 1;
        }

        items
    }

    /// Last line of a brace declaration starting at `first`
    fn brace_end(&self, first: usize, hi: usize, depth: usize) -> Option<usize> {
        let mut opened = false;
        for j in first..hi {
            let line = &self.lines[j];
            if line.opens {
                opened = true;
            }
            if opened {
                if line.depth_after <= depth {
                    return Some(j);
                }
                continue;
            }
            if line.trimmed().ends_with(';') {
                return Some(j);
            }
            if (j > first && line.is_blank()) || j - first >= MAX_HEADER_LINES {
                return None;
            }
        }
        // Unterminated block runs to the end of the range
        opened.then(|| hi.saturating_sub(1).max(first))
    }

    fn indent_items(&self, lo: usize, hi: usize, indent: usize, nested: bool) -> Vec<CodeItem> {
        let mut items = Vec::new();
        let mut floor = lo;
        let mut i = lo;

        while i < hi {
            let line = &self.lines[i];
            if line.is_blank() || line.indent != indent || !INDENT_DECL.is_match(line.trimmed()) {
                i += 1;
                continue;
            }

            let mut end = i;
            let mut member_indent = None;
            for j in i + 1..hi {
                let next = &self.lines[j];
                if next.is_blank() {
                    continue;
                }
                let trimmed = next.trimmed();
                if next.indent > indent {
                    member_indent.get_or_insert(next.indent);
                    end = j;
                    continue;
                }
                if next.indent == indent
                    && (END_KEYWORD.is_match(trimmed) || trimmed.starts_with([')', ']', '}']))
                {
                    end = j;
                    if trimmed.starts_with([')', ']', '}']) {
                        continue;
                    }
                }
                break;
            }

            let members = match member_indent {
                Some(inner) if !nested && CONTAINER.is_match(line.trimmed()) => {
                    self.indent_items(i + 1, end + 1, inner, true)
                }
                _ => Vec::new(),
            };
            items.push(self.item(self.leading_start(i, floor), i, end, members));
            floor = end + 1;
            i = end + 1;
        }

        items
    }

    /// First line of the comment/annotation block directly above `decl`
    fn leading_start(&self, decl: usize, floor: usize) -> usize {
        let comments = self.language.comment_prefixes();
        let annotations = self.language.annotation_prefixes();
        let mut start = decl;
        while start > floor {
            let above = self.lines[start - 1].trimmed();
            let attached = !above.is_empty()
                && (comments.iter().any(|p| above.starts_with(p))
                    || annotations.iter().any(|p| above.starts_with(p)));
            if !attached {
                break;
            }
            start -= 1;
        }
        start
    }

    fn item(&self, first: usize, decl: usize, last: usize, members: Vec<CodeItem>) -> CodeItem {
        let decl_line = &self.lines[decl];
        let header_start = decl_line.start + (decl_line.text.len() - decl_line.text.trim_start().len());
        CodeItem {
            span: Span::new(self.lines[first].start, self.lines[last].end),
            signature: signature(self.src, header_start, self.language.family()),
            members,
        }
    }
}

fn is_brace_declaration(line: &str) -> bool {
    if BRACE_DECL.is_match(line) {
        return true;
    }
    let Some(caps) = C_FUNCTION.captures(line) else {
        return false;
    };
    let prefix = caps.get(1).map_or("", |m| m.as_str()).trim();
    let name = caps.get(2).map_or("", |m| m.as_str());
    let first_word = line
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");

    if CONTROL_WORDS.contains(&name) || CONTROL_WORDS.contains(&first_word) {
        return false;
    }
    // `obj.method(..)` is a call, not a definition
    if prefix.ends_with('.') {
        return false;
    }
    !prefix.is_empty() || line.trim_end().ends_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn signatures(items: &[CodeItem]) -> Vec<&str> {
        items.iter().map(|i| i.signature.as_str()).collect()
    }

    #[test]
    fn test_go_functions_and_types() {
        let src = r#"package main

import "fmt"

// Point is a 2D point.
type Point struct {
	X, Y int
}

// Norm returns "{" as a joke.
func (p Point) Norm() string {
	if p.X > 0 {
		return "{"
	}
	return "}"
}

func main() {
	fmt.Println(Point{})
}
"#;
        let items = items(src, Language::Go);
        assert_eq!(
            signatures(&items),
            vec!["type Point struct", "func (p Point) Norm() string", "func main()"]
        );
        assert!(items[0].span.slice(src).starts_with("// Point is a 2D point."));
        assert!(items[1].span.slice(src).ends_with("return \"}\"\n}"));
    }

    #[test]
    fn test_java_class_members() {
        let src = r#"/** Greeter. */
@Service
public class Greeter {
    private final String name;

    public Greeter(String name) {
        this.name = name;
    }

    /** Says hello. */
    public String greet() {
        if (name == null) {
            return "";
        }
        return "hi " + name;
    }
}
"#;
        let items = items(src, Language::Java);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].signature, "public class Greeter");
        assert!(items[0].span.slice(src).starts_with("/** Greeter. */\n@Service"));
        assert_eq!(
            signatures(&items[0].members),
            vec!["public Greeter(String name)", "public String greet()"]
        );
        assert!(items[0].members[1].span.slice(src).starts_with("/** Says hello. */"));
    }

    #[test]
    fn test_c_allman_braces_and_control_flow() {
        let src = "int add(int a, int b);\n\nint add(int a, int b)\n{\n    if (a) {\n        return a + b;\n    }\n    return b;\n}\n";
        let items = items(src, Language::C);
        assert_eq!(signatures(&items), vec!["int add(int a, int b)"]);
        assert!(items[0].span.slice(src).starts_with("int add(int a, int b)\n{"));
        assert!(items[0].span.slice(src).ends_with("return b;\n}"));
    }

    #[test]
    fn test_ruby_classes_with_end() {
        let src = "# A widget\nclass Widget\n  def initialize(name)\n    @name = name\n  end\n\n  def to_s\n    @name\n  end\nend\n\nputs Widget.new('x')\n";
        let items = items(src, Language::Ruby);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].signature, "class Widget");
        assert!(items[0].span.slice(src).starts_with("# A widget"));
        assert!(items[0].span.slice(src).ends_with("end\nend"));
        assert_eq!(
            signatures(&items[0].members),
            vec!["def initialize(name)", "def to_s"]
        );
    }

    #[test]
    fn test_lua_functions() {
        let src = "local M = {}\n\n-- adds numbers\nfunction M.add(a, b)\n  return a + b\nend\n\nreturn M\n";
        let items = items(src, Language::Lua);
        assert_eq!(signatures(&items), vec!["function M.add(a, b)"]);
        assert!(items[0].span.slice(src).starts_with("-- adds numbers"));
    }
}
