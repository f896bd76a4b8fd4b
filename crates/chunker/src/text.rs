//! Byte-span helpers shared by the chunking strategies.
//!
//! Every strategy works on spans of the original document so that chunk offsets always point
//! back into the source. All span boundaries produced here fall on UTF-8 character boundaries.

/// Half-open byte range `[start, end)` into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn slice(self, src: &str) -> &str {
        &src[self.start..self.end]
    }

    /// Shrink the span to exclude surrounding whitespace; `None` when nothing is left.
    pub fn trimmed(self, src: &str) -> Option<Self> {
        let text = self.slice(src);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lead = text.len() - text.trim_start().len();
        let start = self.start + lead;
        Some(Self::new(start, start + trimmed.len()))
    }

    /// Span covering both `self` and `other`
    pub fn join(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Blank-line separated paragraphs inside `within`, each trimmed
pub(crate) fn paragraph_spans(src: &str, within: Span) -> Vec<Span> {
    let mut out = Vec::new();
    let mut current: Option<Span> = None;
    let mut offset = within.start;

    for line in within.slice(src).split_inclusive('\n') {
        let line_span = Span::new(offset, offset + line.len());
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(paragraph) = current.take() {
                out.extend(paragraph.trimmed(src));
            }
        } else {
            current = Some(current.map_or(line_span, |p| p.join(line_span)));
        }
    }
    if let Some(paragraph) = current {
        out.extend(paragraph.trimmed(src));
    }

    out
}

/// Non-blank lines inside `within`. Indentation is kept, line terminators are not.
pub(crate) fn line_spans(src: &str, within: Span) -> Vec<Span> {
    let mut out = Vec::new();
    let mut offset = within.start;

    for line in within.slice(src).split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end();
        if !content.trim_start().is_empty() {
            out.push(Span::new(start, start + content.len()));
        }
    }

    out
}

/// Cut `span` into pieces of at most `max` bytes at character boundaries.
pub(crate) fn forced_split(src: &str, span: Span, max: usize) -> Vec<Span> {
    let mut out = Vec::new();
    let mut start = span.start;

    while start < span.end {
        let mut end = (start + max).min(span.end);
        while end > start && !src.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single character wider than `max`; emit it whole.
            end = start + 1;
            while end < span.end && !src.is_char_boundary(end) {
                end += 1;
            }
        }
        out.extend(Span::new(start, end).trimmed(src));
        start = end;
    }

    out
}

/// Break `span` into pieces no longer than `max`, preferring paragraph, then line boundaries.
///
/// The result is in document order and is meant to be fed to [`pack`].
pub(crate) fn split_to_fit(src: &str, span: Span, max: usize) -> Vec<Span> {
    if span.len() <= max {
        return span.trimmed(src).into_iter().collect();
    }

    let mut out = Vec::new();
    for paragraph in paragraph_spans(src, span) {
        if paragraph.len() <= max {
            out.push(paragraph);
            continue;
        }
        let lines: Vec<Span> = line_spans(src, paragraph)
            .into_iter()
            .flat_map(|line| {
                if line.len() <= max {
                    vec![line]
                } else {
                    forced_split(src, line, max)
                }
            })
            .collect();
        out.extend(pack(&lines, max));
    }

    out
}

/// Greedily merge adjacent spans while the merged span stays within `max`.
pub(crate) fn pack(spans: &[Span], max: usize) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    for &span in spans {
        match out.last_mut() {
            Some(last) if span.end - last.start <= max => last.end = span.end,
            _ => out.push(span),
        }
    }
    out
}

/// Trailing context of `text` that fits in `overlap` bytes: whole lines when possible,
/// otherwise the last `overlap` bytes.
pub(crate) fn tail_overlap(text: &str, overlap: usize) -> &str {
    if text.len() <= overlap {
        return text;
    }

    let window = text.len() - overlap;
    let bytes = text.as_bytes();
    if let Some(pos) = bytes[window - 1..].iter().position(|&b| b == b'\n') {
        let line_start = window + pos;
        if line_start < text.len() {
            return &text[line_start..];
        }
    }

    let mut start = window;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Maps byte offsets to 1-based line numbers
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            src.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// Line containing the byte at `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Inclusive line range of a non-empty span
    pub fn lines_of(&self, span: Span) -> (usize, usize) {
        let start = self.line_of(span.start);
        let end = self.line_of(span.end.saturating_sub(1).max(span.start));
        (start, end)
    }
}
