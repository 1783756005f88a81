use crate::*;
use sqlparser::{
    ast,
    dialect::PostgreSqlDialect,
    parser::{Parser, ParserError},
};

static POSTGRES: PostgreSqlDialect = PostgreSqlDialect {};

/// Output of a successful strict parse. Empty for whitespace and comment
/// only text.
#[derive(Debug, Clone, PartialEq)]
pub struct StrictTree(pub Vec<ast::Statement>);

impl StrictTree {
    pub fn statements(&self) -> &[ast::Statement] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a statement failed the strict parse. `range` is relative to the
/// statement text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub range: Option<TextRange>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: Option<TextRange>) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }

    fn from_parser(sql: &str, error: ParserError) -> Self {
        let message = match error {
            ParserError::TokenizerError(message) | ParserError::ParserError(message) => message,
            ParserError::RecursionLimitExceeded => "recursion limit exceeded".to_string(),
        };
        let Some(at) = message.rfind(" at Line: ") else {
            return Self::new(message, None);
        };
        let range = location(&message[at + " at Line: ".len()..])
            .and_then(|(line, column)| offset_of(sql, line, column))
            .map(|offset| token_range_at(sql, offset));
        Self::new(&message[..at], range)
    }
}

/// `<line>, Column: <column>` as printed by sqlparser.
fn location(text: &str) -> Option<(usize, usize)> {
    let (line, column) = text.split_once(", Column: ")?;
    let line = line.trim().parse().ok()?;
    let column = column.trim().parse().ok()?;
    Some((line, column))
}

/// Byte offset of a 1-based line and character column.
fn offset_of(sql: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }
    let mut offset = 0;
    let mut lines = sql.split_inclusive('\n');
    for _ in 1..line {
        offset += lines.next()?.len();
    }
    let current = lines.next().unwrap_or("");
    let within: usize = current.chars().take(column - 1).map(char::len_utf8).sum();
    Some(offset + within)
}

/// Range of the token starting at `offset`, or an empty range there.
pub(crate) fn token_range_at(sql: &str, offset: usize) -> TextRange {
    sql::Tokenizer::starting_at(sql, offset)
        .next()
        .filter(|token| token.start == offset)
        .map(|token| TextRange::new(token.start, token.end))
        .unwrap_or(TextRange::empty(offset))
}

/// Grammar exact parser. Either the whole text parses or nothing does.
pub trait StrictParser: Send + Sync {
    fn parse(&self, sql: &str) -> std::result::Result<StrictTree, SyntaxError>;
}

/// [`StrictParser`] backed by sqlparser's PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgStrictParser;

impl StrictParser for PgStrictParser {
    fn parse(&self, sql: &str) -> std::result::Result<StrictTree, SyntaxError> {
        if sql::Tokenizer::new(sql).next().is_none() {
            return Ok(StrictTree(Vec::new()));
        }
        Parser::parse_sql(&POSTGRES, sql)
            .map(StrictTree)
            .map_err(|error| SyntaxError::from_parser(sql, error))
    }
}
