//! Completion ranking.
//!
//! Each rule looks at one candidate in one context and returns a score
//! delta. Rules are independent of each other and their deltas add up.
use crate::*;
use itertools::Itertools;

/// A relation of the completion context found in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelation<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub visible: &'a str,
    /// Named by the cursor's own scope rather than an enclosing one.
    pub local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier<'a> {
    None,
    Relation { schema: &'a str, table: &'a str },
    Schema(&'a str),
    Unknown,
}

pub struct ScoringContext<'a> {
    pub completion: &'a CompletionContext,
    pub default_schema: &'a str,
    pub relations: Vec<ResolvedRelation<'a>>,
    pub qualifier: Qualifier<'a>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        completion: &'a CompletionContext,
        snapshot: &'a SchemaSnapshot,
        default_schema: &'a str,
    ) -> Self {
        let local = completion.relations.len();
        let relations: Vec<_> = completion
            .all_relations()
            .enumerate()
            .filter_map(|(i, relation)| {
                let table = resolve(snapshot, relation, default_schema)?;
                Some(ResolvedRelation {
                    schema: &table.schema,
                    table: &table.name,
                    visible: relation.visible_name(),
                    local: i < local,
                })
            })
            .collect();

        let qualifier = match completion.qualifier.as_deref() {
            None => Qualifier::None,
            Some(name) => {
                if let Some(relation) = relations
                    .iter()
                    .find(|r| r.visible.eq_ignore_ascii_case(name))
                {
                    Qualifier::Relation {
                        schema: relation.schema,
                        table: relation.table,
                    }
                } else if let Some(schema) = snapshot
                    .schemas
                    .iter()
                    .find(|s| s.name == name)
                    .or_else(|| snapshot.schemas.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
                {
                    Qualifier::Schema(&schema.name)
                } else {
                    Qualifier::Unknown
                }
            }
        };

        Self {
            completion,
            default_schema,
            relations,
            qualifier,
        }
    }

    fn is_local(&self, candidate: &Candidate) -> bool {
        self.relations.iter().any(|r| {
            r.local && candidate.schema == Some(r.schema) && candidate.table == Some(r.table)
        })
    }
}

/// Unquoted names fold to lower case, so a miss is retried folded.
fn resolve<'s>(snapshot: &'s SchemaSnapshot, relation: &Relation, default_schema: &str) -> Option<&'s Table> {
    snapshot
        .resolve_table(relation.schema.as_deref(), &relation.name, default_schema)
        .or_else(|| {
            let schema = relation.schema.as_deref().map(str::to_lowercase);
            snapshot.resolve_table(schema.as_deref(), &relation.name.to_lowercase(), default_schema)
        })
}

pub type ScoringRule = fn(&ScoringContext, &Candidate) -> i32;

pub const SCORING_RULES: &[(&str, ScoringRule)] = &[
    ("clause-expectation", clause_expectation),
    ("referenced-table", referenced_table),
    ("qualifier", qualifier_match),
    ("foreign-schema", foreign_schema),
    ("prefix", prefix_match),
    ("expression-function", expression_function),
];

pub fn clause_expectation(context: &ScoringContext, candidate: &Candidate) -> i32 {
    let Some(clause) = context.completion.clause else {
        return 0;
    };
    match candidate.kind {
        ItemKind::Column if clause.is_expression() => 4,
        ItemKind::Table if clause.names_relations() => 10,
        ItemKind::Schema if clause.names_relations() => 6,
        ItemKind::Column | ItemKind::Function if clause.names_relations() => -10,
        _ => 0,
    }
}

pub fn referenced_table(context: &ScoringContext, candidate: &Candidate) -> i32 {
    if candidate.kind == ItemKind::Column && context.is_local(candidate) {
        8
    } else {
        0
    }
}

pub fn qualifier_match(context: &ScoringContext, candidate: &Candidate) -> i32 {
    match context.qualifier {
        Qualifier::None => 0,
        Qualifier::Relation { schema, table } => {
            let owned = candidate.schema == Some(schema) && candidate.table == Some(table);
            if candidate.kind == ItemKind::Column && owned { 15 } else { -20 }
        }
        Qualifier::Schema(schema) => {
            let contained = matches!(candidate.kind, ItemKind::Table | ItemKind::Function)
                && candidate.schema == Some(schema);
            if contained { 10 } else { -20 }
        }
        Qualifier::Unknown => -20,
    }
}

pub fn foreign_schema(context: &ScoringContext, candidate: &Candidate) -> i32 {
    let foreign = candidate.schema.is_some_and(|s| s != context.default_schema);
    if context.completion.qualifier.is_none() && foreign { -3 } else { 0 }
}

pub fn prefix_match(context: &ScoringContext, candidate: &Candidate) -> i32 {
    let prefix = context.completion.prefix.to_lowercase();
    if prefix.is_empty() {
        return 0;
    }
    let name = candidate.name.to_lowercase();
    if name.starts_with(&prefix) {
        5
    } else if name.contains(&prefix) {
        -2
    } else {
        -100
    }
}

pub fn expression_function(context: &ScoringContext, candidate: &Candidate) -> i32 {
    let expression = context.completion.clause.is_some_and(ClauseKind::is_expression);
    if candidate.kind == ItemKind::Function && expression { 4 } else { 0 }
}

/// Scores every candidate, keeps those reaching `min_score` and returns at
/// most `max_items` of them, best first.
#[derive(Debug, Clone)]
pub struct Scorer {
    rules: Vec<(&'static str, ScoringRule)>,
    min_score: i32,
    max_items: usize,
}

impl Scorer {
    pub fn new(min_score: i32, max_items: usize) -> Self {
        Self::with_rules(SCORING_RULES.to_vec(), min_score, max_items)
    }

    pub fn with_rules(rules: Vec<(&'static str, ScoringRule)>, min_score: i32, max_items: usize) -> Self {
        Self {
            rules,
            min_score,
            max_items,
        }
    }

    pub fn score(&self, context: &ScoringContext, candidate: &Candidate) -> i32 {
        self.rules.iter().map(|(_, rule)| rule(context, candidate)).sum()
    }

    pub fn rank(
        &self,
        completion: &CompletionContext,
        snapshot: &SchemaSnapshot,
        default_schema: &str,
    ) -> Vec<ScoredItem> {
        let context = ScoringContext::new(completion, snapshot, default_schema);
        let candidates = Candidate::all(snapshot);
        let total = candidates.len();
        let items: Vec<_> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = self.score(&context, &candidate);
                (score >= self.min_score).then(|| ScoredItem::new(candidate, score))
            })
            .sorted_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| a.label.cmp(&b.label))
                    .then_with(|| a.schema.cmp(&b.schema))
                    .then_with(|| a.kind.cmp(&b.kind))
                    .then_with(|| a.detail.cmp(&b.detail))
            })
            .dedup()
            .take(self.max_items)
            .collect();
        trace!(candidates = total, kept = items.len(), "Ranked completions");
        items
    }
}

impl From<&Config> for Scorer {
    fn from(config: &Config) -> Self {
        Self::new(config.min_completion_score, config.max_completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::default();
        snapshot
            .insert_table("public", "example", [("id", "uuid"), ("name", "text")])
            .insert_table("public", "users", [("user_id", "uuid"), ("email", "text")])
            .insert_table("audit", "events", [("id", "uuid"), ("at", "timestamp")])
            .insert_function(Function::new("public", "lookup"))
            .insert_function(Function::new("pg_catalog", "lower"));
        snapshot
    }

    fn rank(sql: &str, offset: usize, scorer: &Scorer, default_schema: &str) -> Vec<ScoredItem> {
        let tree = LenientParser.parse(sql);
        let context = CompletionContext::at(&tree, offset);
        scorer.rank(&context, &snapshot(), default_schema)
    }

    fn labels(sql: &str, offset: usize) -> Vec<String> {
        rank(sql, offset, &Scorer::new(5, 50), "public")
            .into_iter()
            .map(|item| item.label)
            .collect()
    }

    #[rstest]
    // single table
    #[case("SELECT  FROM example", 7, vec!["id", "name"])]
    // nested subquery isolation
    #[case("SELECT (SELECT  FROM example) FROM users", 15, vec!["id", "name"])]
    // join with aliases
    #[case("SELECT  FROM example e JOIN users u ON e.id = u.user_id", 7, vec!["email", "id", "name", "user_id"])]
    // alias qualifier
    #[case("SELECT u. FROM example e JOIN users u", 9, vec!["email", "user_id"])]
    // table name qualifier
    #[case("SELECT example. FROM example", 15, vec!["id", "name"])]
    // prefix
    #[case("SELECT na FROM example", 9, vec!["name"])]
    #[case("SELECT am FROM example", 9, vec!["name"])]
    // relation clauses
    #[case("SELECT * FROM ", 14, vec!["example", "users", "events", "audit", "pg_catalog", "public"])]
    #[case("SELECT * FROM audit.", 20, vec!["events"])]
    #[case("INSERT INTO us", 14, vec!["users"])]
    #[case("UPDATE ", 7, vec!["example", "users", "events", "audit", "pg_catalog", "public"])]
    // functions in expressions
    #[case("SELECT lo FROM example", 9, vec!["lookup", "lower"])]
    // unknown qualifier or table
    #[case("SELECT x. FROM example", 9, vec![])]
    #[case("SELECT  FROM missing", 7, vec![])]
    // no clause yet
    #[case("", 0, vec![])]
    fn should_recommend(#[case] sql: &str, #[case] offset: usize, #[case] expected: Vec<&str>) {
        assert_eq!(labels(sql, offset), expected);
    }

    #[test]
    fn scores_add_up() {
        let items = rank("SELECT u. FROM users u", 9, &Scorer::new(5, 50), "public");
        assert!(items.iter().all(|item| item.score == 4 + 8 + 15), "{items:?}");
        let items = rank("SELECT am FROM example", 9, &Scorer::new(5, 50), "public");
        assert_eq!(items[0].score, 4 + 8 - 2);
    }

    #[test]
    fn equal_scores_and_names_order_by_schema() {
        let mut snapshot = SchemaSnapshot::default();
        snapshot
            .insert_table("public", "users", [("id", "uuid")])
            .insert_table("audit", "users", [("id", "uuid")]);
        let tree = LenientParser.parse("SELECT * FROM ");
        let context = CompletionContext::at(&tree, 14);
        let items = Scorer::new(5, 50).rank(&context, &snapshot, "elsewhere");
        let ranked: Vec<_> = items
            .iter()
            .map(|item| (item.label.as_str(), item.schema.as_deref(), item.score))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("users", Some("audit"), 7),
                ("users", Some("public"), 7),
                ("audit", None, 6),
                ("public", None, 6),
            ]
        );
    }

    #[test]
    fn ranking_is_deterministic() {
        let sql = "SELECT  FROM example e JOIN users u";
        let first = rank(sql, 7, &Scorer::new(5, 50), "public");
        for _ in 0..5 {
            assert_eq!(rank(sql, 7, &Scorer::new(5, 50), "public"), first);
        }
    }

    #[rstest]
    #[case(Scorer::new(13, 50), 0)]
    #[case(Scorer::new(12, 50), 2)]
    #[case(Scorer::new(5, 1), 1)]
    fn threshold_and_limit(#[case] scorer: Scorer, #[case] expected: usize) {
        assert_eq!(rank("SELECT  FROM example", 7, &scorer, "public").len(), expected);
    }

    #[test]
    fn rules_can_be_replaced() {
        fn flat(_: &ScoringContext, _: &Candidate) -> i32 {
            5
        }
        let scorer = Scorer::with_rules(vec![("flat", flat as ScoringRule)], 5, 50);
        assert_eq!(rank("", 0, &scorer, "public").len(), snapshot().schemas.len() + 3 + 6 + 2);
    }
}
