//! Textual fallback: split on `;` and blank lines.
//!
//! Used when the precedence scan meets something it cannot classify, such as
//! a statement that starts with a plain word. Always makes progress, so the
//! splitter terminates on any input.
use crate::sql::{Token, TokenKind};

/// True if the gap between two tokens holds an empty line.
pub fn blank_line_between(sql: &str, end: usize, start: usize) -> bool {
    let gap = &sql[end..start];
    let mut lines = gap.split('\n');
    lines.next();
    let Some(mut current) = lines.next() else {
        return false;
    };
    for next in lines {
        if current.trim().is_empty() {
            return true;
        }
        current = next;
    }
    false
}

/// Index just past the fallback span beginning at token `from`: the span
/// ends after the next `;`, or before the first token preceded by a blank
/// line.
fn end_of_span(sql: &str, tokens: &[Token], from: usize) -> usize {
    let mut i = from;
    while i < tokens.len() {
        if i > from && blank_line_between(sql, tokens[i - 1].end, tokens[i].start) {
            return i;
        }
        if tokens[i].kind == TokenKind::Semicolon {
            return i + 1;
        }
        i += 1;
    }
    tokens.len()
}

/// Start an unparseable span at token `from`. Returns the byte offset the
/// span starts at and the index of the first token after it.
pub fn span(sql: &str, tokens: &[Token], from: usize) -> (usize, usize) {
    (tokens[from].start, end_of_span(sql, tokens, from))
}

/// Finish an already open statement textually from token `from` on.
pub fn tail(sql: &str, tokens: &[Token], from: usize) -> usize {
    end_of_span(sql, tokens, from)
}
