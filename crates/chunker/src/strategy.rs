use crate::text::{pack, split_to_fit, Span};

/// Strategy output before it is turned into a [`crate::Chunk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Piece {
    /// Source span covered by this piece
    pub span: Span,
    /// Text placed before the source slice (repeated header row, carried overlap)
    pub prefix: Option<String>,
    pub header_context: Vec<String>,
    pub code_context: Option<String>,
}

impl Piece {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            prefix: None,
            header_context: Vec::new(),
            code_context: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.header_context = headers;
        self
    }

    #[must_use]
    pub fn with_code_context(mut self, context: Option<String>) -> Self {
        self.code_context = context;
        self
    }

    /// Final chunk text
    pub fn text(&self, src: &str) -> String {
        let body = self.span.slice(src);
        match &self.prefix {
            Some(prefix) => {
                let mut out = String::with_capacity(prefix.len() + body.len());
                out.push_str(prefix);
                out.push_str(body);
                out
            }
            None => body.to_string(),
        }
    }

    #[cfg(test)]
    pub fn text_len(&self) -> usize {
        self.prefix.as_ref().map_or(0, String::len) + self.span.len()
    }
}

/// Paragraphs strategy: blank-line paragraphs merged greedily up to `max`.
pub(crate) fn chunk_paragraphs(src: &str, max: usize) -> Vec<Piece> {
    let whole = Span::new(0, src.len());
    pack(&split_to_fit(src, whole, max), max)
        .into_iter()
        .map(Piece::new)
        .collect()
}
