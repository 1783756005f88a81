//! Whitespace and comments never produce tokens. Literal contents are not
//! kept; splitting and completion only care where a literal is.

use crate::sql::keyword::Keyword;

/// Classification for a token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Table / alias / column / generic identifier, original casing.
    Ident(String),
    /// `"Quoted"` identifier with the quotes removed and `""` unescaped.
    QuotedIdent(String),
    /// Recognized SQL keyword.
    Keyword(Keyword),
    /// String literal: `'..'`, `E'..'` or dollar quoted `$tag$..$tag$`.
    String,
    /// Numeric literal.
    Number,
    /// Positional parameter such as `$1`.
    Param,
    /// Comma `,`.
    Comma,
    /// Dot `.` (qualified names like `schema.table.column`).
    Dot,
    /// Opening parenthesis `(`.
    ParenOpen,
    /// Closing parenthesis `)`.
    ParenClose,
    /// Statement terminator `;`.
    Semicolon,
    /// Any other single punctuation / operator character.
    Other(char),
}

impl TokenKind {
    /// True if this token is the given keyword.
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == kw)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            TokenKind::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    /// Returns the identifier text if this token is an unquoted `Ident`.
    pub fn ident(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Identifier text for quoted or unquoted identifiers.
    pub fn name(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(s) | TokenKind::QuotedIdent(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convenience: returns true if this token represents any identifier.
    pub fn is_ident(&self) -> bool {
        matches!(self, TokenKind::Ident(_) | TokenKind::QuotedIdent(_))
    }

    /// Operator characters that always need a right operand.
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Other('=' | '<' | '>' | '+' | '-' | '/' | '%' | '|' | '&' | '^' | '!' | ':')
        )
    }
}
