use crate::*;
use std::sync::Arc;

/// Runs both parsers over statements and caches the reconciled outcome.
pub struct ParseEngine {
    strict: Arc<dyn StrictParser>,
    tolerant: Arc<dyn TolerantParser>,
    cache: StatementCache<ParseOutcome>,
    stats: Arc<Stats>,
}

impl ParseEngine {
    pub fn new(
        strict: Arc<dyn StrictParser>,
        tolerant: Arc<dyn TolerantParser>,
        capacity: u64,
        stats: Arc<Stats>,
    ) -> Self {
        Self {
            strict,
            tolerant,
            cache: StatementCache::new(capacity),
            stats,
        }
    }

    pub fn postgres(capacity: u64, stats: Arc<Stats>) -> Self {
        Self::new(Arc::new(PgStrictParser), Arc::new(LenientParser), capacity, stats)
    }

    /// Parse outcome of `statement`, served from the cache while its content
    /// hash is unchanged.
    ///
    /// `previous` names the statement this one was edited from. When that
    /// statement's outcome is still cached its tolerant tree is reparsed
    /// instead of built from scratch.
    pub async fn outcome(
        &self,
        key: &StatementKey,
        statement: &Statement,
        previous: Option<(&StatementKey, &TextEdit)>,
    ) -> Arc<ParseOutcome> {
        if let Some(outcome) = self.cache.get(key, statement.content_hash).await {
            return outcome;
        }

        let mut tolerant = None;
        if let Some((previous, edit)) = previous
            && let Some(entry) = self.cache.peek(previous).await
            && let Some(tree) = entry.value.tolerant()
            && edit.fits(tree.text())
        {
            let reparsed = self.tolerant.reparse(tree, edit);
            self.stats.record_tolerant_reparse();
            if reparsed.text() == statement.text {
                tolerant = Some(reparsed);
            }
        }
        let tolerant = match tolerant {
            Some(tree) => tree,
            None => {
                self.stats.record_tolerant_parse();
                self.tolerant.parse(&statement.text)
            }
        };

        self.stats.record_strict_parse();
        let strict = self.strict.parse(&statement.text);
        if let Err(error) = &strict {
            trace!(statement = %key, %error, "Strict parse failed");
        }

        let outcome = Arc::new(ParseOutcome::reconcile(strict, tolerant));
        self.cache
            .insert(key, statement.content_hash, Arc::clone(&outcome))
            .await;
        outcome
    }

    pub async fn invalidate(&self, key: &StatementKey) {
        self.cache.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (ParseEngine, Arc<Stats>) {
        let stats = Arc::new(Stats::default());
        (ParseEngine::postgres(64, Arc::clone(&stats)), stats)
    }

    #[tokio::test]
    async fn unchanged_statements_are_not_reparsed() {
        let (engine, stats) = engine();
        let key = StatementKey::new("a.sql", StatementId(0));
        let statement = Statement::new(StatementId(0), TextRange::new(0, 9), "select 1;");

        let first = engine.outcome(&key, &statement, None).await;
        let moved = Statement::new(StatementId(0), TextRange::new(40, 49), "select 1;");
        let second = engine.outcome(&key, &moved, None).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stats.snapshot().strict_parses, 1);
        assert_eq!(stats.snapshot().tolerant_parses, 1);
    }

    #[tokio::test]
    async fn edited_statements_reparse_from_their_predecessor() {
        let (engine, stats) = engine();
        let old_key = StatementKey::new("a.sql", StatementId(0));
        let old = Statement::new(StatementId(0), TextRange::new(0, 15), "select a from t");
        engine.outcome(&old_key, &old, None).await;

        let edit = TextEdit::insert(8, ", b");
        let new_key = StatementKey::new("a.sql", StatementId(1));
        let new = Statement::new(StatementId(1), TextRange::new(0, 18), "select a, b from t");
        let outcome = engine.outcome(&new_key, &new, Some((&old_key, &edit))).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.tolerant_parses, 1);
        assert_eq!(snapshot.tolerant_reparses, 1);
        assert_eq!(
            outcome.tolerant().map(|t| t.as_ref().clone()),
            Some(LenientParser.parse("select a, b from t"))
        );
    }

    #[tokio::test]
    async fn missing_predecessor_falls_back_to_a_full_parse() {
        let (engine, stats) = engine();
        let missing = StatementKey::new("a.sql", StatementId(5));
        let key = StatementKey::new("a.sql", StatementId(6));
        let statement = Statement::new(StatementId(6), TextRange::new(0, 8), "select 2");
        let edit = TextEdit::new(TextRange::new(7, 8), "2");
        engine.outcome(&key, &statement, Some((&missing, &edit))).await;
        assert_eq!(stats.snapshot().tolerant_reparses, 0);
        assert_eq!(stats.snapshot().tolerant_parses, 1);
    }
}
