// Splits raw source text into top-level, semicolon- or block-terminated
// statements, honoring `//` comments and nested braces, without ever
// constructing an intermediate rewritten string.
//
// An alternative approach strips comments and sweeps balanced `{...}`
// regions out into placeholder tokens so that a later naive split-on-`;` is
// safe, then tracks a cumulative size differential to map stripped-string
// offsets back to raw ones. Scanning the raw text directly with a depth
// counter and a comment-skip predicate produces the same statement
// boundaries without ever leaving raw-offset space, so there is no
// differential to track.

use crate::error::{FrontendError, FrontendResult};
use qdbg_data_structures::Span;

#[derive(Clone, Debug)]
pub struct RawStatement {
    /// Full span of the statement, including any trailing `{ ... }` block.
    pub span: Span,
    /// Span of the block's contents (excluding the braces), if the statement
    /// ends in one.
    pub block: Option<Span>,
}

/// Byte ranges of every `//...` run up to (not including) the next `\n`.
#[must_use]
pub fn comment_spans(raw: &str) -> Vec<Span> {
    let bytes = raw.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == b'/' && bytes[i + 1] == b'/' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            spans.push(Span::new(start as u32, i as u32));
        } else {
            i += 1;
        }
    }
    spans
}

fn is_commented(comments: &[Span], idx: usize) -> bool {
    comments
        .iter()
        .any(|span| span.contains(idx as u32))
}

/// Splits `raw[range]` into top-level statements. A statement ends either at
/// a top-level `;` or, if it contains a top-level `{...}` block, right after
/// that block's closing brace (an optional trailing `;` is then skipped).
pub fn split_statements(
    raw: &str,
    comments: &[Span],
    range: std::ops::Range<usize>,
) -> FrontendResult<Vec<RawStatement>> {
    let bytes = raw.as_bytes();
    let mut statements = Vec::new();
    let mut depth = 0i32;
    let mut stmt_start = range.start;
    let mut block_start: Option<usize> = None;
    let mut unmatched_open: Option<usize> = None;
    let mut i = range.start;

    while i < range.end {
        if is_commented(comments, i) {
            i += 1;
            continue;
        }
        match bytes[i] {
            b'{' => {
                if depth == 0 {
                    block_start = Some(i);
                    unmatched_open = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = block_start.take() {
                        unmatched_open = None;
                        let end = i + 1;
                        let block = Span::new((start + 1) as u32, i as u32);
                        statements.push(RawStatement {
                            span: Span::new(stmt_start as u32, end as u32),
                            block: Some(block),
                        });
                        let mut next = end;
                        // skip an optional trailing ';' and whitespace/comments
                        while next < range.end
                            && (bytes[next].is_ascii_whitespace() || is_commented(comments, next))
                        {
                            next += 1;
                        }
                        if next < range.end && bytes[next] == b';' {
                            next += 1;
                        }
                        stmt_start = next;
                        i = next;
                        continue;
                    }
                }
            }
            b';' if depth == 0 => {
                statements.push(RawStatement {
                    span: Span::new(stmt_start as u32, (i + 1) as u32),
                    block: None,
                });
                stmt_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(start) = unmatched_open {
        return Err(FrontendError::UnbalancedBraces(Span::new(
            start as u32,
            range.end as u32,
        )));
    }

    if stmt_start < range.end {
        let tail = Span::new(stmt_start as u32, range.end as u32);
        if !tail.slice(raw).trim().is_empty() {
            statements.push(RawStatement { span: tail, block: None });
        }
    }

    Ok(statements)
}

/// The statement's text with any embedded `//` comments blanked out, used
/// for classification (keyword matching). The stored `span` always stays
/// raw-inclusive for position reporting.
#[must_use]
pub fn classification_text(raw: &str, comments: &[Span], stmt: &RawStatement) -> String {
    let lo = stmt.span.lo as usize;
    let hi = stmt.span.hi as usize;
    raw[lo..hi]
        .char_indices()
        .map(|(offset, ch)| {
            if is_commented(comments, lo + offset) {
                ' '
            } else {
                ch
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_statements() {
        let raw = "qreg q[2]; h q[0]; cx q[0], q[1];";
        let comments = comment_spans(raw);
        let stmts = split_statements(raw, &comments, 0..raw.len()).unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[1].span.slice(raw), " h q[0];");
    }

    #[test]
    fn captures_gate_definition_block_without_trailing_semicolon() {
        let raw = "gate my q { x q; } qreg q[1]; my q[0];";
        let comments = comment_spans(raw);
        let stmts = split_statements(raw, &comments, 0..raw.len()).unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].block.is_some());
        let block = stmts[0].block.unwrap();
        assert_eq!(block.slice(raw), " x q; ");
    }

    #[test]
    fn ignores_semicolons_inside_comments() {
        let raw = "h q[0]; // a comment; with a fake terminator\nx q[0];";
        let comments = comment_spans(raw);
        let stmts = split_statements(raw, &comments, 0..raw.len()).unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn unterminated_block_reports_unbalanced_braces() {
        let raw = "gate my q { x q;";
        let comments = comment_spans(raw);
        let err = split_statements(raw, &comments, 0..raw.len()).unwrap_err();
        let FrontendError::UnbalancedBraces(span) = err else {
            panic!("expected UnbalancedBraces, got {err:?}");
        };
        assert_eq!(span.slice(raw), "{ x q;");
    }
}
