use crate::strategy::Piece;
use crate::text::{pack, split_to_fit, Span};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Body of a heading section together with its heading path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub trail: Vec<String>,
    pub body: Span,
}

struct Heading {
    level: usize,
    title: String,
    start: usize,
    end: usize,
}

/// Collect ATX and setext headings. Lines inside fenced code blocks are never headings.
///
/// Also returns the byte offset where content begins, which is past any YAML front matter.
fn headings(src: &str) -> (Vec<Heading>, usize) {
    let mut out = Vec::new();
    let mut current: Option<Heading> = None;
    let mut content_start = 0;

    let options = Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    for (event, range) in Parser::new_ext(src, options).into_offset_iter() {
        match event {
            Event::Start(Tag::MetadataBlock(_)) | Event::End(TagEnd::MetadataBlock(_)) => {
                let end = front_matter_end(src).unwrap_or(range.end);
                content_start = content_start.max(end);
            }
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level: level as usize,
                    title: String::new(),
                    start: range.start,
                    end: range.end,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.split_whitespace().collect::<Vec<_>>().join(" ");
                    out.push(heading);
                }
            }
            _ => {}
        }
    }

    (out, content_start)
}

/// Offset just past the closing `---` or `...` line of front matter opened on the first line
fn front_matter_end(src: &str) -> Option<usize> {
    let mut offset = 0;
    for (idx, line) in src.split_inclusive('\n').enumerate() {
        offset += line.len();
        let fence = line.trim_end();
        if idx == 0 {
            if fence != "---" {
                return None;
            }
        } else if fence == "---" || fence == "..." {
            return Some(offset);
        }
    }
    None
}

/// Split a markdown document into heading sections.
///
/// Each section runs from the end of its heading to the start of the next heading of any
/// level. Sections whose body is blank are dropped; text before the first heading forms a
/// section with an empty trail. YAML front matter belongs to no section.
pub(crate) fn sections(src: &str) -> Vec<Section> {
    let (headings, content_start) = headings(src);
    let mut out = Vec::with_capacity(headings.len() + 1);

    let preamble_end = headings.first().map_or(src.len(), |h| h.start);
    out.extend(
        Span::new(content_start.min(preamble_end), preamble_end)
            .trimmed(src)
            .map(|body| Section { trail: Vec::new(), body }),
    );

    let mut stack: Vec<(usize, &str)> = Vec::new();
    for (idx, heading) in headings.iter().enumerate() {
        while stack.last().is_some_and(|&(level, _)| level >= heading.level) {
            stack.pop();
        }
        stack.push((heading.level, heading.title.as_str()));

        let next_start = headings.get(idx + 1).map_or(src.len(), |h| h.start);
        let body = Span::new(heading.end.min(next_start), next_start);
        if let Some(body) = body.trimmed(src) {
            let trail = stack
                .iter()
                .filter(|(_, title)| !title.is_empty())
                .map(|(_, title)| (*title).to_string())
                .collect();
            out.push(Section { trail, body });
        }
    }

    out
}

/// Sections strategy: one or more pieces per heading section, never crossing a heading.
pub(crate) fn chunk_sections(src: &str, max: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for section in sections(src) {
        let spans = if section.body.len() <= max {
            vec![section.body]
        } else {
            log::debug!(
                "Section '{}' is {} bytes, splitting on paragraphs",
                section.trail.join(" > "),
                section.body.len()
            );
            pack(&split_to_fit(src, section.body, max), max)
        };
        pieces.extend(
            spans
                .into_iter()
                .map(|span| Piece::new(span).with_headers(section.trail.clone())),
        );
    }
    pieces
}
