use crate::*;
use std::sync::Arc;

/// Local part of a statement's diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// Nothing left to ask the database for.
    Ready(Vec<Diagnostic>),
    /// Lint findings of a statement that still needs its type check.
    Pending(Vec<Diagnostic>),
}

/// Turns parse outcomes into diagnostics and caches them per statement.
///
/// Cached diagnostics are relative to their statement and are only valid
/// for the content hash they were computed from.
pub struct DiagnosticsPipeline {
    cache: StatementCache<Vec<Diagnostic>>,
    lints: LintRegistry,
    stats: Arc<Stats>,
}

impl DiagnosticsPipeline {
    pub fn new(capacity: u64, lints: LintRegistry, stats: Arc<Stats>) -> Self {
        Self {
            cache: StatementCache::new(capacity),
            lints,
            stats,
        }
    }

    pub fn lints(&self) -> &LintRegistry {
        &self.lints
    }

    pub async fn cached(&self, key: &StatementKey, content_hash: u64) -> Option<Arc<Vec<Diagnostic>>> {
        self.cache.get(key, content_hash).await
    }

    /// Diagnostics that need no database. A statement without a strict tree
    /// always yields its syntax error. Lints only run over strict trees.
    pub fn analyze(&self, text: &str, outcome: &ParseOutcome, type_check: bool) -> Analysis {
        self.stats.record_diagnostic_computation();
        let Some(tree) = outcome.strict() else {
            let diagnostic = match outcome.syntax_error() {
                Some(error) => Diagnostic::syntax(
                    error.range.unwrap_or_else(|| content_range(text)),
                    error.message.clone(),
                ),
                None => Diagnostic::syntax(content_range(text), "statement does not parse"),
            };
            return Analysis::Ready(vec![diagnostic]);
        };
        if tree.is_empty() {
            return Analysis::Ready(Vec::new());
        }
        let lints = self.lints.run(&LintContext::new(text, tree));
        if type_check {
            Analysis::Pending(lints)
        } else {
            Analysis::Ready(sorted(lints))
        }
    }

    /// Merge type errors reported by the database into a pending analysis.
    pub fn complete(&self, text: &str, lints: Vec<Diagnostic>, errors: &[TypeError]) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<_> = errors
            .iter()
            .map(|error| {
                let range = error
                    .position
                    .map(|offset| token_range_at(text, offset))
                    .unwrap_or_else(|| content_range(text));
                Diagnostic::type_error(range, error)
            })
            .collect();
        diagnostics.extend(lints);
        sorted(diagnostics)
    }

    pub async fn store(
        &self,
        key: &StatementKey,
        content_hash: u64,
        diagnostics: Vec<Diagnostic>,
    ) -> Arc<Vec<Diagnostic>> {
        let diagnostics = Arc::new(diagnostics);
        self.cache
            .insert(key, content_hash, Arc::clone(&diagnostics))
            .await;
        diagnostics
    }

    pub async fn invalidate(&self, key: &StatementKey) {
        self.cache.invalidate(key).await;
    }
}

fn sorted(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by_key(|d| (d.range.start, d.range.end));
    diagnostics
}
