use crate::sql::{keyword::Keyword, token_kind::TokenKind};

/// A token and its byte span `[start, end)` in the text it was lexed from.
/// Spans fall on character boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub const fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// Unquoted identifier text.
    pub fn ident(&self) -> Option<&str> {
        self.kind.ident()
    }

    /// Quoted or unquoted identifier text.
    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind.is_keyword(kw)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        self.kind.keyword()
    }

    pub fn text<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start..self.end]
    }

    /// Copy of this token moved by `delta` bytes.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            kind: self.kind.clone(),
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }
}
