//! Host facing entry point.
//!
//! A [`Workspace`] owns every open document. Calls against one document
//! serialize on that document's lock, calls against different documents run
//! in parallel. The lock is not held while a type check is in flight.
//! Parse and diagnostic caches belong to their document and go away when it
//! is closed.
use crate::*;
use futures::future::join_all;
use sqlx::postgres::PgPoolOptions;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

/// Identity and position of a live statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{id} {range}")]
pub struct StatementInfo {
    pub id: StatementId,
    pub range: TextRange,
}

impl From<&Statement> for StatementInfo {
    fn from(statement: &Statement) -> Self {
        Self {
            id: statement.id,
            range: statement.range,
        }
    }
}

pub struct DocumentHandle {
    document: Mutex<Document>,
    engine: ParseEngine,
    diagnostics: DiagnosticsPipeline,
}

impl DocumentHandle {
    fn new(document: Document, capacity: u64, lints: LintRegistry, stats: &Arc<Stats>) -> Self {
        Self {
            document: Mutex::new(document),
            engine: ParseEngine::postgres(capacity, Arc::clone(stats)),
            diagnostics: DiagnosticsPipeline::new(capacity, lints, Arc::clone(stats)),
        }
    }
}

/// Diagnostics of one statement as collected under the document lock.
enum Collected {
    Ready(Arc<Vec<Diagnostic>>),
    Pending { text: String, lints: Vec<Diagnostic> },
}

struct Slot {
    id: StatementId,
    content_hash: u64,
    collected: Collected,
}

pub struct Workspace {
    documents: Data<Arc<DocumentHandle>>,
    lints: LintRegistry,
    cache_capacity: u64,
    scorer: Scorer,
    schema: SchemaCache,
    schema_source: Option<Arc<dyn SchemaSource>>,
    authority: Option<Arc<dyn DatabaseAuthority>>,
    default_schema: String,
    stats: Arc<Stats>,
}

impl Workspace {
    /// Workspace without a database: no type checks and no schema, so
    /// completion stays empty.
    pub fn new(config: &Config) -> Self {
        let stats = Arc::new(Stats::default());
        let lints = LintRegistry::default().without(&config.disabled_lint_rules);
        Self {
            documents: RwLock::new(HashMap::new()),
            lints,
            cache_capacity: config.cache_capacity,
            scorer: Scorer::from(config),
            schema: SchemaCache::default(),
            schema_source: None,
            authority: None,
            default_schema: config.default_schema.clone(),
            stats,
        }
    }

    /// Workspace backed by the database at `config.database_url`, if any.
    /// Connections are opened on first use.
    pub fn connect(config: &Config) -> Result<Self> {
        let workspace = Self::new(config);
        let Some(url) = config.database_url.as_deref() else {
            info!("No database configured, type checks and schema completion are off");
            return Ok(workspace);
        };
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(url)?;
        Ok(workspace
            .with_authority(Arc::new(PgAuthority::new(pool.clone())))
            .with_schema_source(Arc::new(PgSchemaSource::new(pool))))
    }

    pub fn with_authority(mut self, authority: Arc<dyn DatabaseAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn with_schema_source(mut self, source: Arc<dyn SchemaSource>) -> Self {
        self.schema_source = Some(source);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.authority.is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    async fn handle(&self, key: &str) -> Result<Arc<DocumentHandle>> {
        self.documents
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UnknownDocument(key.to_string()))
    }

    pub async fn open_document(&self, key: &str, text: impl Into<String>) -> Result<Vec<StatementInfo>> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(key) {
            return Err(Error::DocumentExists(key.to_string()));
        }
        let document = Document::open(key, text);
        let statements = document.statements().map(StatementInfo::from).collect();
        let handle = DocumentHandle::new(document, self.cache_capacity, self.lints.clone(), &self.stats);
        documents.insert(key.to_string(), Arc::new(handle));
        Ok(statements)
    }

    /// Replace `range` with `text`. A rejected edit leaves the document
    /// as it was.
    pub async fn apply_edit(&self, key: &str, range: TextRange, text: impl Into<String>) -> Result<EditOutcome> {
        let handle = self.handle(key).await?;
        let mut document = handle.document.lock().await;
        let edit = TextEdit::new(range, text);
        let outcome = document.apply_edit(&edit)?;

        // Reparse edited statements while their predecessor's tree is cached.
        for created in &outcome.created {
            if let Some((previous, edit)) = &created.predecessor
                && let Some(statement) = document.get(created.id)
            {
                let key = document.statement_key(created.id);
                let previous = document.statement_key(*previous);
                handle.engine.outcome(&key, statement, Some((&previous, edit))).await;
            }
        }
        for id in &outcome.retired {
            let key = document.statement_key(*id);
            handle.engine.invalidate(&key).await;
            handle.diagnostics.invalidate(&key).await;
        }
        debug!(
            document = key,
            retired = outcome.retired.len(),
            created = outcome.created.len(),
            shifted = outcome.shifted,
            "Applied edit"
        );
        Ok(outcome)
    }

    /// Forget the document together with its caches. Requests still in
    /// flight finish against the closed handle.
    pub async fn close_document(&self, key: &str) -> Result {
        self.documents
            .write()
            .await
            .remove(key)
            .ok_or_else(|| Error::UnknownDocument(key.to_string()))?;
        debug!(document = key, "Closed document");
        Ok(())
    }

    pub async fn statements(&self, key: &str) -> Result<Vec<StatementInfo>> {
        let handle = self.handle(key).await?;
        let document = handle.document.lock().await;
        Ok(document.statements().map(StatementInfo::from).collect())
    }

    /// Populate the schema cache if a source is configured, retrying an
    /// earlier failed fetch. Returns whether a snapshot is available.
    pub async fn load_schema(&self) -> bool {
        match &self.schema_source {
            Some(source) => self.schema.refresh(source.as_ref()).await,
            None => false,
        }
    }

    /// Schema for a request. Fetches at most once until a fetch succeeds or
    /// [`load_schema`](Workspace::load_schema) is called.
    async fn schema(&self) -> Option<Arc<SchemaSnapshot>> {
        if let Some(source) = &self.schema_source {
            self.schema.load(source.as_ref()).await;
        }
        self.schema.snapshot().await
    }

    /// Diagnostics of every statement, in document order and document
    /// offsets.
    pub async fn get_diagnostics(&self, key: &str) -> Result<Vec<Diagnostic>> {
        let handle = self.handle(key).await?;
        let slots = self.collect(&handle).await;

        let authority = self.authority.as_deref();
        let stats = &self.stats;
        let checks = slots.iter().map(|slot| async move {
            match (&slot.collected, authority) {
                (Collected::Pending { text, .. }, Some(authority)) => {
                    stats.record_type_check();
                    Some(authority.validate(text).await)
                }
                _ => None,
            }
        });
        let results = join_all(checks).await;

        // The response describes the document as it is now. Statements
        // created while the checks were in flight get their local analysis.
        let document = handle.document.lock().await;
        let mut checked: HashMap<StatementId, (Slot, Option<Result<Vec<TypeError>>>)> = slots
            .into_iter()
            .zip(results)
            .map(|(slot, result)| (slot.id, (slot, result)))
            .collect();
        let mut diagnostics = Vec::new();
        for statement in document.statements() {
            let found = match checked.remove(&statement.id) {
                Some((slot, result)) if slot.content_hash == statement.content_hash => {
                    self.merge(&handle, &document, slot, result).await
                }
                stale => {
                    if let Some((slot, _)) = stale {
                        self.discard(key, &slot);
                    }
                    self.local(&handle, &document, statement).await
                }
            };
            diagnostics.extend(found.iter().map(|d| d.at(statement.range.start)));
        }
        for (slot, _) in checked.values() {
            self.discard(key, slot);
        }
        Ok(diagnostics)
    }

    async fn merge(
        &self,
        handle: &DocumentHandle,
        document: &Document,
        slot: Slot,
        result: Option<Result<Vec<TypeError>>>,
    ) -> Arc<Vec<Diagnostic>> {
        let pipeline = &handle.diagnostics;
        match slot.collected {
            Collected::Ready(found) => found,
            Collected::Pending { text, lints } => match result {
                Some(Ok(errors)) => {
                    let found = pipeline.complete(&text, lints, &errors);
                    let key = document.statement_key(slot.id);
                    pipeline.store(&key, slot.content_hash, found).await
                }
                Some(Err(error)) => {
                    warn!(document = document.key(), statement = %slot.id, "Type check failed: {error}");
                    Arc::new(pipeline.complete(&text, lints, &[]))
                }
                None => Arc::new(pipeline.complete(&text, lints, &[])),
            },
        }
    }

    /// Diagnostics of a statement that missed this request's type checks.
    /// Cached only when a type check would not have added anything.
    async fn local(
        &self,
        handle: &DocumentHandle,
        document: &Document,
        statement: &Statement,
    ) -> Arc<Vec<Diagnostic>> {
        let key = document.statement_key(statement.id);
        if let Some(found) = handle.diagnostics.cached(&key, statement.content_hash).await {
            return found;
        }
        let outcome = handle.engine.outcome(&key, statement, None).await;
        let (Analysis::Ready(found) | Analysis::Pending(found)) =
            handle.diagnostics.analyze(&statement.text, &outcome, false);
        let needs_type_check =
            self.authority.is_some() && outcome.strict().is_some_and(|tree| !tree.is_empty());
        if needs_type_check {
            Arc::new(found)
        } else {
            handle
                .diagnostics
                .store(&key, statement.content_hash, found)
                .await
        }
    }

    fn discard(&self, key: &str, slot: &Slot) {
        if matches!(slot.collected, Collected::Pending { .. }) {
            self.stats.record_stale_type_check();
            debug!(document = key, statement = %slot.id, "Discarded stale type check");
        }
    }

    /// Everything that can be decided without the database. The document
    /// lock is held for the duration.
    async fn collect(&self, handle: &DocumentHandle) -> Vec<Slot> {
        let document = handle.document.lock().await;
        let type_check = self.authority.is_some();
        let mut slots = Vec::new();
        for statement in document.statements() {
            let key = document.statement_key(statement.id);
            let collected = match handle.diagnostics.cached(&key, statement.content_hash).await {
                Some(found) => Collected::Ready(found),
                None => {
                    let outcome = handle.engine.outcome(&key, statement, None).await;
                    match handle.diagnostics.analyze(&statement.text, &outcome, type_check) {
                        Analysis::Ready(found) => Collected::Ready(
                            handle
                                .diagnostics
                                .store(&key, statement.content_hash, found)
                                .await,
                        ),
                        Analysis::Pending(lints) => Collected::Pending {
                            text: statement.text.clone(),
                            lints,
                        },
                    }
                }
            };
            slots.push(Slot {
                id: statement.id,
                content_hash: statement.content_hash,
                collected,
            });
        }
        slots
    }

    /// Ranked completion items at byte `position`. Empty while no schema is
    /// available.
    pub async fn get_completions(&self, key: &str, position: usize) -> Result<Vec<ScoredItem>> {
        let handle = self.handle(key).await?;
        let Some(snapshot) = self.schema().await else {
            trace!(document = key, "No schema, no completions");
            return Ok(Vec::new());
        };

        let document = handle.document.lock().await;
        let Some(statement) = document.statement_at_cursor(position) else {
            return Ok(Vec::new());
        };
        let key = document.statement_key(statement.id);
        let outcome = handle.engine.outcome(&key, statement, None).await;
        let Some(tree) = outcome.tolerant() else {
            return Ok(Vec::new());
        };
        let context = CompletionContext::at(tree, position - statement.range.start);
        Ok(self.scorer.rank(&context, &snapshot, &self.default_schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(&settings())
    }

    fn users() -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::default();
        snapshot.insert_table("public", "users", [("id", "integer"), ("name", "text")]);
        snapshot
    }

    fn labels(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[tokio::test]
    async fn open_lists_statements() -> Result {
        let workspace = workspace();
        let statements = workspace.open_document("a.sql", "select 1;\nselect 2;\n").await?;
        assert_eq!(
            statements,
            vec![
                StatementInfo {
                    id: StatementId(0),
                    range: TextRange::new(0, 10)
                },
                StatementInfo {
                    id: StatementId(1),
                    range: TextRange::new(10, 20)
                },
            ]
        );
        assert_eq!(workspace.statements("a.sql").await?, statements);
        Ok(())
    }

    #[tokio::test]
    async fn caller_contract_violations_are_errors() -> Result {
        let workspace = workspace();
        workspace.open_document("a.sql", "select 1;").await?;
        assert!(matches!(
            workspace.open_document("a.sql", "").await,
            Err(Error::DocumentExists(_))
        ));
        assert!(matches!(
            workspace.get_diagnostics("b.sql").await,
            Err(Error::UnknownDocument(_))
        ));
        assert!(matches!(
            workspace.apply_edit("a.sql", TextRange::new(5, 50), "x").await,
            Err(Error::EditConflict { len: 9, .. })
        ));
        assert_eq!(workspace.statements("a.sql").await?.len(), 1);

        workspace.close_document("a.sql").await?;
        assert!(matches!(
            workspace.close_document("a.sql").await,
            Err(Error::UnknownDocument(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn edits_keep_untouched_identities() -> Result {
        let workspace = workspace();
        workspace.open_document("a.sql", "select 1;\nselect 2;\nselect 3;\n").await?;
        let outcome = workspace.apply_edit("a.sql", TextRange::new(17, 18), "42").await?;
        assert_eq!(outcome.retired, vec![StatementId(1)]);
        assert_eq!(outcome.shifted, 1);

        let ids: Vec<_> = workspace
            .statements("a.sql")
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![StatementId(0), StatementId(3), StatementId(2)]);
        Ok(())
    }

    #[tokio::test]
    async fn diagnostics_without_a_database() -> Result {
        let workspace = workspace();
        workspace
            .open_document("a.sql", "select 1 +;\ndelete from t;\nselect 1;\n")
            .await?;
        let diagnostics = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(diagnostics.len(), 2, "{diagnostics:?}");

        assert_eq!(diagnostics[0].category, Category::Syntax);
        assert!(diagnostics[0].range.end <= 12);
        assert_eq!(diagnostics[1].category, Category::Lint);
        assert_eq!(diagnostics[1].range, TextRange::new(12, 18));
        assert!(diagnostics.iter().all(|d| d.category != Category::Type));
        Ok(())
    }

    #[tokio::test]
    async fn unchanged_statements_reuse_their_diagnostics() -> Result {
        let workspace = workspace();
        workspace
            .open_document("a.sql", "delete from t;\nselect * from t;\n")
            .await?;
        let first = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(workspace.stats().diagnostic_computations, 2);

        assert_eq!(workspace.get_diagnostics("a.sql").await?, first);
        assert_eq!(workspace.stats().diagnostic_computations, 2);

        // Editing the first statement shifts the second, which stays cached.
        workspace
            .apply_edit("a.sql", TextRange::new(12, 13), "users")
            .await?;
        let shifted = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(workspace.stats().diagnostic_computations, 3);
        assert_eq!(shifted[0].range, TextRange::new(0, 6));
        assert_eq!(shifted[1].range, first[1].range.shift(4));
        Ok(())
    }

    #[tokio::test]
    async fn disabled_lint_rules_do_not_run() -> Result {
        let mut config = settings();
        config.disabled_lint_rules = vec!["unbounded-mutation".to_string()];
        let workspace = Workspace::new(&config);
        workspace.open_document("a.sql", "delete from t;").await?;
        assert!(workspace.get_diagnostics("a.sql").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn type_errors_land_at_document_offsets() -> Result {
        let authority = Arc::new(StaticAuthority::new().with_errors(
            "select nope from t;\n",
            vec![TypeError::new("42703", r#"column "nope" does not exist"#, Some(7))],
        ));
        let workspace = workspace().with_authority(authority.clone());
        workspace
            .open_document("a.sql", "select 1;\nselect nope from t;\n")
            .await?;

        let diagnostics = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Type);
        assert_eq!(diagnostics[0].rule.as_deref(), Some("42703"));
        assert_eq!(diagnostics[0].range, TextRange::new(17, 21));
        assert_eq!(authority.calls(), 2);

        workspace.get_diagnostics("a.sql").await?;
        assert_eq!(authority.calls(), 2);
        assert_eq!(workspace.stats().type_checks, 2);
        Ok(())
    }

    #[tokio::test]
    async fn authority_failures_keep_lints_and_retry() -> Result {
        let authority = Arc::new(FailingAuthority::default());
        let workspace = workspace().with_authority(authority.clone());
        workspace.open_document("a.sql", "delete from t;").await?;

        let diagnostics = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Lint);

        workspace.get_diagnostics("a.sql").await?;
        assert_eq!(authority.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn syntax_errors_skip_the_type_check() -> Result {
        let authority = Arc::new(StaticAuthority::new());
        let workspace = workspace().with_authority(authority.clone());
        workspace.open_document("a.sql", "select 1 +;\n\n").await?;
        let diagnostics = workspace.get_diagnostics("a.sql").await?;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Syntax);
        assert_eq!(authority.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn stale_type_checks_are_discarded() -> Result {
        let (authority, gate) = StaticAuthority::new()
            .with_errors(
                "select b from u;\n",
                vec![TypeError::new("42P01", r#"relation "u" does not exist"#, Some(14))],
            )
            .gated();
        let workspace = Arc::new(workspace().with_authority(Arc::new(authority)));
        workspace
            .open_document("a.sql", "select a from t;\nselect b from u;\n")
            .await?;

        let pending = {
            let workspace = Arc::clone(&workspace);
            tokio::spawn(async move { workspace.get_diagnostics("a.sql").await })
        };
        gate.entered.notified().await;

        // The document is not locked while the type checks are in flight.
        workspace
            .apply_edit("a.sql", TextRange::new(24, 25), "c")
            .await?;
        gate.release.notify_waiters();

        let diagnostics = pending.await.map_err(|e| Error::Internal(e.to_string()))??;
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(workspace.stats().type_checks, 2);
        assert_eq!(workspace.stats().stale_type_checks, 1);
        Ok(())
    }

    #[tokio::test]
    async fn edits_during_type_checks_are_answered_with_the_current_document() -> Result {
        let (authority, gate) = StaticAuthority::new().gated();
        let authority = Arc::new(authority);
        let workspace = Arc::new(workspace().with_authority(authority.clone()));
        workspace
            .open_document("a.sql", "select a from t where a = 1;\nselect b from u where b = 1;\n")
            .await?;

        let pending = {
            let workspace = Arc::clone(&workspace);
            tokio::spawn(async move { workspace.get_diagnostics("a.sql").await })
        };
        gate.entered.notified().await;
        workspace.apply_edit("a.sql", TextRange::new(55, 56), "").await?;
        gate.release.notify_waiters();

        let diagnostics = pending.await.map_err(|e| Error::Internal(e.to_string()))??;
        assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
        assert_eq!(diagnostics[0].category, Category::Syntax);
        assert_eq!(diagnostics[0].range, TextRange::new(55, 56));
        assert_eq!(workspace.stats().stale_type_checks, 1);

        assert_eq!(workspace.get_diagnostics("a.sql").await?, diagnostics);
        assert_eq!(authority.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn completions_need_a_schema() -> Result {
        let workspace = workspace();
        workspace.open_document("a.sql", "SELECT  FROM users;").await?;
        assert!(workspace.get_completions("a.sql", 7).await?.is_empty());
        assert!(!workspace.load_schema().await);

        let workspace =
            Workspace::new(&settings()).with_schema_source(Arc::new(FailingSchemaSource::default()));
        workspace.open_document("a.sql", "SELECT  FROM users;").await?;
        assert!(workspace.get_completions("a.sql", 7).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_schema_fetch_is_not_repeated_per_completion() -> Result {
        let source = Arc::new(FailingSchemaSource::default());
        let workspace = workspace().with_schema_source(source.clone());
        workspace.open_document("a.sql", "SELECT  FROM users;").await?;
        for _ in 0..5 {
            assert!(workspace.get_completions("a.sql", 7).await?.is_empty());
        }
        assert_eq!(source.calls(), 1);

        assert!(!workspace.load_schema().await);
        assert_eq!(source.calls(), 2);
        workspace.get_completions("a.sql", 7).await?;
        assert_eq!(source.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn completes_columns_of_referenced_tables() -> Result {
        let workspace = workspace().with_schema_source(Arc::new(StaticSchemaSource::new(users())));
        workspace.open_document("a.sql", "select 1;\nSELECT  FROM users;").await?;
        let items = workspace.get_completions("a.sql", 17).await?;
        assert_eq!(labels(&items), vec!["id", "name"]);
        assert!(items.iter().all(|item| item.kind == ItemKind::Column));
        Ok(())
    }

    #[tokio::test]
    async fn completion_follows_edits() -> Result {
        let workspace = workspace().with_schema_source(Arc::new(StaticSchemaSource::new(users())));
        workspace.open_document("a.sql", "SELECT  FROM users;").await?;
        workspace.get_completions("a.sql", 7).await?;

        workspace.apply_edit("a.sql", TextRange::empty(7), "na").await?;
        assert_eq!(workspace.stats().tolerant_reparses, 1);
        let items = workspace.get_completions("a.sql", 9).await?;
        assert_eq!(labels(&items), vec!["name"]);
        assert_eq!(workspace.stats().tolerant_parses, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unterminated_statement_owns_the_cursor_at_its_end() -> Result {
        let workspace = workspace().with_schema_source(Arc::new(StaticSchemaSource::new(users())));
        let statements = workspace
            .open_document("a.sql", "SELECT * FROM users WHERE (na)select 2")
            .await?;
        assert_eq!(statements[1].range.start, 30);
        let items = workspace.get_completions("a.sql", 30).await?;
        assert_eq!(labels(&items), vec!["id", "name"]);
        Ok(())
    }

    #[tokio::test]
    async fn documents_are_independent() -> Result {
        let workspace = Arc::new(workspace());
        let opens = (0..4).map(|i| {
            let workspace = Arc::clone(&workspace);
            tokio::spawn(async move {
                let key = format!("{i}.sql");
                workspace.open_document(&key, "delete from t;").await?;
                workspace.apply_edit(&key, TextRange::new(12, 13), "users").await?;
                workspace.get_diagnostics(&key).await
            })
        });
        for result in join_all(opens).await {
            let diagnostics = result.map_err(|e| Error::Internal(e.to_string()))??;
            assert_eq!(diagnostics.len(), 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn caches_belong_to_their_document() -> Result {
        let workspace = workspace();
        workspace.open_document("a.sql", "delete from t;").await?;
        workspace.open_document("b.sql", "delete from t;").await?;
        workspace.get_diagnostics("a.sql").await?;
        workspace.get_diagnostics("b.sql").await?;
        // Same identity and text in two documents, computed once each.
        assert_eq!(workspace.stats().diagnostic_computations, 2);

        workspace.close_document("b.sql").await?;
        workspace.get_diagnostics("a.sql").await?;
        assert_eq!(workspace.stats().diagnostic_computations, 2);

        workspace.open_document("b.sql", "delete from t;").await?;
        workspace.get_diagnostics("b.sql").await?;
        assert_eq!(workspace.stats().diagnostic_computations, 3);
        assert_eq!(workspace.stats().strict_parses, 3);
        Ok(())
    }

    #[tokio::test]
    async fn connect_without_a_database_url() -> Result {
        let workspace = Workspace::connect(&settings())?;
        assert!(!workspace.is_connected());

        let mut config = settings();
        config.database_url = Some("postgres://postgres@127.0.0.1:1/postgres".to_string());
        assert!(Workspace::connect(&config)?.is_connected());
        Ok(())
    }

    mod integration {
        use super::*;

        #[test_context(IsolatedIntegrationTest)]
        #[tokio::test]
        async fn type_checks_and_completes_against_postgres(ctx: &mut IsolatedIntegrationTest) -> Result {
            sqlx::query("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)")
                .execute(&ctx.pool)
                .await?;
            let workspace = Workspace::new(&settings())
                .with_authority(Arc::new(PgAuthority::new(ctx.pool.clone())))
                .with_schema_source(Arc::new(PgSchemaSource::new(ctx.pool.clone())));

            workspace
                .open_document("a.sql", "SELECT id FROM users;\nSELECT nope FROM users;\n")
                .await?;
            let diagnostics = workspace.get_diagnostics("a.sql").await?;
            assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
            assert_eq!(diagnostics[0].category, Category::Type);
            assert_eq!(diagnostics[0].rule.as_deref(), Some("42703"));
            assert_eq!(diagnostics[0].range, TextRange::new(29, 33));

            workspace.open_document("b.sql", "SELECT  FROM users").await?;
            let items = workspace.get_completions("b.sql", 7).await?;
            assert_eq!(labels(&items), vec!["id", "name"]);
            Ok(())
        }
    }
}
