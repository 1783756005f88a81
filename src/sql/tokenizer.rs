use crate::sql::{keyword::Keyword, token::Token, token_kind::TokenKind};

/// Lenient SQL tokenizer producing a flat stream of `Token`s.
///
/// Scope / Intent:
/// - Feeds statement splitting, the tolerant clause tree and completion.
/// - Accepts incomplete / syntactically invalid SQL (e.g. `SELECT FROM`,
///   an unterminated string literal).
///
/// Behavior:
/// - Skips whitespace, `-- line` comments and (nested) `/* block */` comments.
/// - Aggregates identifier runs, preserving original case, and classifies
///   keywords on a lower-cased copy.
/// - Single, escape (`E'..'`) and dollar quoted (`$tag$..$tag$`) literals
///   become one `String` token each, so a `;` inside them is never seen.
///   Unterminated literals, quoted identifiers and comments run to the end
///   of input.
///
/// Complexity:
/// - O(n) time; each call to `next` is independent of the previous tokens,
///   which is what allows re-lexing from any earlier token boundary.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    sql: &'a str,
    pos: usize,
}

/// Characters past the end of a token the tokenizer may read while deciding
/// where that token ends (`1e+5`).
pub const MAX_LOOKAHEAD: usize = 3;

pub fn tokenize(sql: &str) -> Vec<Token> {
    Tokenizer::new(sql).collect()
}

impl<'a> Tokenizer<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self { sql, pos: 0 }
    }

    /// Start lexing at `offset`, which must be a token boundary of a previous
    /// lex of the same text prefix (or 0).
    pub fn starting_at(sql: &'a str, offset: usize) -> Self {
        Self {
            sql,
            pos: offset.min(sql.len()),
        }
    }

    fn peek(&self) -> Option<char> {
        self.sql[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.sql[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.sql[self.pos..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("--") {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                self.skip_block_comment();
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mut depth = 0usize;
        while !self.rest().is_empty() {
            if self.rest().starts_with("/*") {
                depth += 1;
                self.pos += 2;
            } else if self.rest().starts_with("*/") {
                self.pos += 2;
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else {
                self.bump();
            }
        }
    }

    /// Consume a quoted run whose delimiter is doubled to escape it.
    fn quoted(&mut self, quote: char, backslash_escapes: bool) {
        self.bump(); // opening quote
        while let Some(c) = self.bump() {
            if backslash_escapes && c == '\\' {
                self.bump();
            } else if c == quote {
                if self.peek() == Some(quote) {
                    self.bump();
                } else {
                    return;
                }
            }
        }
    }

    /// Length of a `$tag$` opener at the current position, if any.
    fn dollar_tag(&self) -> Option<usize> {
        let rest = self.rest();
        let body = &rest[1..];
        let tag_len = body
            .char_indices()
            .take_while(|(i, c)| c.is_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit()))
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        body[tag_len..].starts_with('$').then_some(tag_len + 2)
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.sql[start..self.pos];
        let lower = text.to_lowercase();
        Keyword::from_lower(&lower)
            .map(TokenKind::Keyword)
            .unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_nth(1).is_none_or(|c| c != '.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start = self.pos;
        let c = self.peek()?;

        let kind = match c {
            '\'' => {
                self.quoted('\'', false);
                TokenKind::String
            }
            'e' | 'E' if self.peek_nth(1) == Some('\'') => {
                self.bump();
                self.quoted('\'', true);
                TokenKind::String
            }
            '"' => {
                self.quoted('"', false);
                let raw = &self.sql[start + 1..self.pos];
                let inner = raw.strip_suffix('"').unwrap_or(raw);
                TokenKind::QuotedIdent(inner.replace("\"\"", "\""))
            }
            '$' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                TokenKind::Param
            }
            '$' => match self.dollar_tag() {
                Some(tag_len) => {
                    let tag = &self.sql[start..start + tag_len];
                    self.pos += tag_len;
                    match self.rest().find(tag) {
                        Some(close) => self.pos += close + tag_len,
                        None => self.pos = self.sql.len(),
                    }
                    TokenKind::String
                }
                None => {
                    self.bump();
                    TokenKind::Other('$')
                }
            },
            c if c.is_ascii_digit() => {
                self.number();
                TokenKind::Number
            }
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' => {
                self.bump();
                self.identifier(start)
            }
            other => {
                self.bump();
                match other {
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '(' => TokenKind::ParenOpen,
                    ')' => TokenKind::ParenClose,
                    ';' => TokenKind::Semicolon,
                    other => TokenKind::Other(other),
                }
            }
        };

        Some(Token::new(kind, start, self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::keyword::Keyword;
    use crate::sql::token_kind::TokenKind;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn basic_select_sequence() {
        let toks = tokenize("SELECT a, b FROM t");
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::Select)));
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::From)));
        assert!(toks.iter().any(|t| t.ident() == Some("a")));
        assert!(toks.iter().any(|t| t.ident() == Some("t")));
    }

    #[test]
    fn preserves_case_for_identifiers() {
        let toks = tokenize("From MyTable");
        assert!(toks[0].is_keyword(Keyword::From));
        assert_eq!(toks[1].ident(), Some("MyTable"));
    }

    #[test]
    fn semicolons_inside_literals_are_not_tokens() {
        let sql = "select 'a;b', $$x;y$$, $fn$ ; $fn$, E'it\\'s;'; select 2";
        let semis = tokenize(sql)
            .iter()
            .filter(|t| t.kind == TokenKind::Semicolon)
            .count();
        assert_eq!(semis, 1);
    }

    #[test]
    fn comments_are_skipped() {
        let sql = "select /* a; /* nested; */ still */ 1 -- trailing; comment\n;";
        assert_eq!(
            kinds(sql),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Number,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn quoted_identifiers_are_unescaped() {
        let toks = tokenize(r#"select "Weird ""Name""" from t"#);
        assert_eq!(toks[1].kind, TokenKind::QuotedIdent(r#"Weird "Name""#.into()));
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let sql = "select 'abc; select 1";
        let toks = tokenize(sql);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].kind, TokenKind::String);
        assert_eq!(toks[1].end, sql.len());
    }

    #[test]
    fn parameters_numbers_and_qualified_names() {
        assert_eq!(
            kinds("a.b = $1 + 1.5e3"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Ident("b".into()),
                TokenKind::Other('='),
                TokenKind::Param,
                TokenKind::Other('+'),
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn multibyte_identifiers_keep_char_boundaries() {
        let sql = "select größe from maße";
        for t in tokenize(sql) {
            assert!(!t.text(sql).is_empty());
        }
        assert!(tokenize(sql).iter().any(|t| t.ident() == Some("größe")));
    }

    #[test]
    fn restarting_at_a_boundary_matches_a_full_lex() {
        let sql = "select a, b from t where c = 'x'";
        let full = tokenize(sql);
        let from_third: Vec<_> = Tokenizer::starting_at(sql, full[2].start).collect();
        assert_eq!(from_third, full[2..].to_vec());
    }
}
