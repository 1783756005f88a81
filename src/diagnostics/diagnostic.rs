use crate::*;
use sql::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Severity {
    #[display("error")]
    Error,
    #[display("warning")]
    Warning,
    #[display("info")]
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Category {
    Syntax,
    Type,
    Lint,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{range} {severity}: {message}")]
pub struct Diagnostic {
    pub range: TextRange,
    pub severity: Severity,
    pub category: Category,
    /// Lint rule id, or the SQLSTATE of a type error.
    pub rule: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn syntax(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            category: Category::Syntax,
            rule: None,
            message: message.into(),
        }
    }

    pub fn type_error(range: TextRange, error: &TypeError) -> Self {
        Self {
            range,
            severity: Severity::Error,
            category: Category::Type,
            rule: Some(error.code.clone()),
            message: error.message.clone(),
        }
    }

    pub fn lint(rule: &str, severity: Severity, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            category: Category::Lint,
            rule: Some(rule.to_string()),
            message: message.into(),
        }
    }

    /// Move a statement relative diagnostic to document offsets.
    pub fn at(&self, statement_start: usize) -> Self {
        Self {
            range: self.range.shift(statement_start as isize),
            ..self.clone()
        }
    }
}

/// Range from the first to the last token of `text`, or all of it when it
/// has none.
pub fn content_range(text: &str) -> TextRange {
    let tokens = tokenize(text);
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => TextRange::new(first.start, last.end),
        _ => TextRange::new(0, text.len()),
    }
}
