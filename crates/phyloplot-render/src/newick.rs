//! Lightweight Newick syntax check.
//!
//! The renderer does the real parsing. This only catches files that are
//! obviously not a tree (wrong upload, truncated file) before a session is
//! created and a process is spawned for nothing.

use crate::error::RenderError;

/// Summary of a syntactically valid Newick string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewickSummary {
    /// Number of leaf nodes (named or not).
    pub leaves: usize,
    /// Deepest parenthesis nesting level.
    pub max_depth: usize,
}

/// Check that `data` is a single, complete Newick tree.
///
/// Accepted: balanced parentheses, single-quoted labels (with `''` as an
/// escaped quote), bracketed comments, and exactly one terminating `;`
/// followed by nothing but whitespace.
pub fn check(data: &[u8]) -> Result<NewickSummary, RenderError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| invalid(format!("not valid UTF-8 ({e})")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim();

    if text.is_empty() {
        return Err(invalid("file is empty"));
    }

    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut leaves = 0usize;
    let mut expecting_node = true;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
                expecting_node = true;
            }
            ',' => {
                if depth == 0 {
                    return Err(invalid(format!("',' outside parentheses at offset {pos}")));
                }
                if expecting_node {
                    leaves += 1;
                }
                expecting_node = true;
            }
            ')' => {
                if depth == 0 {
                    return Err(invalid(format!("unbalanced ')' at offset {pos}")));
                }
                if expecting_node {
                    leaves += 1;
                }
                depth -= 1;
                expecting_node = false;
            }
            ';' => {
                if depth != 0 {
                    return Err(invalid(format!("{depth} unclosed '(' before ';'")));
                }
                if chars.any(|(_, rest)| !rest.is_whitespace()) {
                    return Err(invalid("content after the terminating ';'"));
                }
                if expecting_node {
                    leaves += 1;
                }
                return Ok(NewickSummary { leaves, max_depth });
            }
            '\'' => {
                let mut closed = false;
                while let Some((_, q)) = chars.next() {
                    if q == '\'' {
                        if matches!(chars.peek(), Some((_, '\''))) {
                            chars.next();
                        } else {
                            closed = true;
                            break;
                        }
                    }
                }
                if !closed {
                    return Err(invalid(format!("unterminated quoted label at offset {pos}")));
                }
                if expecting_node {
                    leaves += 1;
                    expecting_node = false;
                }
            }
            '[' => {
                if !chars.by_ref().any(|(_, k)| k == ']') {
                    return Err(invalid(format!("unterminated comment at offset {pos}")));
                }
            }
            ':' => {
                if expecting_node {
                    leaves += 1;
                    expecting_node = false;
                }
            }
            _ if c.is_whitespace() => {}
            _ => {
                if expecting_node {
                    leaves += 1;
                    expecting_node = false;
                }
            }
        }
    }

    Err(invalid("missing terminating ';'"))
}

fn invalid(detail: impl std::fmt::Display) -> RenderError {
    RenderError::validation(format!("tree file is not valid Newick: {detail}"))
}
