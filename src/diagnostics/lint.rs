use crate::*;
use sql::{Token, TokenKind, tokenize};

/// Everything a lint rule may look at. Ranges derived from it are relative
/// to the statement text.
#[derive(Debug)]
pub struct LintContext<'a> {
    pub text: &'a str,
    pub tree: &'a StrictTree,
    pub tokens: Vec<Token>,
}

impl<'a> LintContext<'a> {
    pub fn new(text: &'a str, tree: &'a StrictTree) -> Self {
        Self {
            text,
            tree,
            tokens: tokenize(text),
        }
    }

    /// Tokens outside any parentheses. The parentheses themselves are left
    /// out as well.
    pub fn top_level(&self) -> Vec<&Token> {
        let mut depth = 0usize;
        let mut top = Vec::new();
        for token in &self.tokens {
            match token.kind {
                TokenKind::ParenOpen => depth += 1,
                TokenKind::ParenClose => depth = depth.saturating_sub(1),
                _ if depth == 0 => top.push(token),
                _ => {}
            }
        }
        top
    }

    pub fn content_range(&self) -> TextRange {
        content_range(self.text)
    }
}

pub type LintRule = fn(&LintContext) -> Vec<Diagnostic>;

/// Ordered set of lint rules keyed by rule id.
#[derive(Debug, Clone)]
pub struct LintRegistry {
    rules: Vec<(&'static str, LintRule)>,
}

impl Default for LintRegistry {
    fn default() -> Self {
        Self::new(RULES.to_vec())
    }
}

impl LintRegistry {
    pub fn new(rules: Vec<(&'static str, LintRule)>) -> Self {
        Self { rules }
    }

    /// Registry without the rules named in `disabled`. Unknown ids are
    /// reported and otherwise ignored.
    pub fn without(mut self, disabled: &[String]) -> Self {
        for id in disabled {
            if !self.rules.iter().any(|(rule, _)| rule == id) {
                warn!(rule = %id, "cannot disable unknown lint rule");
            }
        }
        self.rules.retain(|(rule, _)| !disabled.iter().any(|id| id == rule));
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(id, _)| *id)
    }

    pub fn run(&self, context: &LintContext) -> Vec<Diagnostic> {
        self.rules
            .iter()
            .flat_map(|(id, rule)| {
                let found = rule(context);
                if !found.is_empty() {
                    trace!(rule = id, count = found.len(), "lint rule matched");
                }
                found
            })
            .collect()
    }
}
