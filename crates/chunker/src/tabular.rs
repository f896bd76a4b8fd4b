use crate::strategy::Piece;
use crate::text::{forced_split, Span};

/// Field delimiter and quoting rules of a delimited file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dialect {
    pub delimiter: u8,
    /// Whether `"` opens a quoted field (CSV). TSV has no quoting.
    pub quoted: bool,
}

impl Dialect {
    pub const CSV: Self = Self {
        delimiter: b',',
        quoted: true,
    };
    pub const TSV: Self = Self {
        delimiter: b'\t',
        quoted: false,
    };

    pub fn from_path(path: &str) -> Self {
        let ext = path.rsplit_once('.').map_or("", |(_, ext)| ext);
        if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") {
            Self::TSV
        } else {
            Self::CSV
        }
    }
}

/// Rows of a delimited file; blank rows are skipped.
///
/// With quoting, a `"` opens a quoted field only at the start of a field, `""` inside a
/// quoted field is an escaped quote, and newlines inside a quoted field do not end the row.
/// Any other `"` is an ordinary character.
pub(crate) fn row_spans(src: &str, dialect: Dialect) -> Vec<Span> {
    let bytes = src.as_bytes();
    let mut rows = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if in_quotes {
            if byte == b'"' {
                if bytes.get(idx + 1) == Some(&b'"') {
                    idx += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if byte == b'\n' {
            rows.extend(Span::new(start, idx).trimmed(src));
            start = idx + 1;
            field_start = true;
            idx += 1;
            continue;
        } else if byte == b'"' && dialect.quoted && field_start {
            in_quotes = true;
        }
        field_start = !in_quotes && byte == dialect.delimiter;
        idx += 1;
    }
    if start < src.len() {
        rows.extend(Span::new(start, src.len()).trimmed(src));
    }

    rows
}

struct Group {
    span: Span,
    rows: usize,
    prefixed: bool,
}

/// Row-groups strategy.
///
/// The first group starts at the header row itself when its first data row fits beside it;
/// every other group carries the header row as a text prefix. Groups hold at most
/// `rows_per_chunk` data rows and never exceed `max` bytes including the prefix. A header too
/// long to repeat (more than half of `max`) is only emitted once.
pub(crate) fn chunk_rows(
    src: &str,
    dialect: Dialect,
    max: usize,
    rows_per_chunk: usize,
) -> Vec<Piece> {
    let rows = row_spans(src, dialect);
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let prefix = (header.len() + 1 <= max / 2).then(|| format!("{}\n", header.slice(src)));
    let prefix_len = prefix.as_ref().map_or(0, String::len);
    let mut pieces = Vec::new();

    let emit = |pieces: &mut Vec<Piece>, span: Span, prefixed: bool| {
        let piece = Piece::new(span).with_prefix(if prefixed { prefix.clone() } else { None });
        pieces.push(piece);
    };

    let mut open = if header.len() <= max {
        Some(Group {
            span: *header,
            rows: 0,
            prefixed: false,
        })
    } else {
        for part in forced_split(src, *header, max) {
            emit(&mut pieces, part, false);
        }
        None
    };

    for row in data {
        if let Some(group) = open.take() {
            let budget = if group.prefixed { max - prefix_len } else { max };
            if group.rows < rows_per_chunk && row.end - group.span.start <= budget {
                open = Some(Group {
                    span: group.span.join(*row),
                    rows: group.rows + 1,
                    prefixed: group.prefixed,
                });
                continue;
            }
            // A bare header is carried as the prefix of the next group instead
            let bare_header = group.rows == 0 && !group.prefixed;
            if !(bare_header && prefix.is_some()) {
                emit(&mut pieces, group.span, group.prefixed);
            }
        }

        let prefixed = prefix.is_some();
        let budget = max - prefix_len;
        if row.len() <= budget {
            open = Some(Group {
                span: *row,
                rows: 1,
                prefixed,
            });
        } else {
            log::debug!("Row of {} bytes exceeds chunk limit, splitting", row.len());
            for part in forced_split(src, *row, budget) {
                emit(&mut pieces, part, prefixed);
            }
        }
    }

    if let Some(group) = open {
        emit(&mut pieces, group.span, group.prefixed);
    }

    pieces
}
