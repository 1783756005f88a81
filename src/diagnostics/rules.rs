//! Built-in lint rules.
//!
//! Rules match statement shapes on the sqlparser AST and take positions from
//! the statement's own tokens, so every diagnostic points at source text.
use crate::*;
use sql::{Keyword, Token, TokenKind};
use sqlparser::ast::{ObjectType, SelectItem, SetExpr, Statement};

pub const RULES: &[(&str, LintRule)] = &[
    ("ban-drop-table", ban_drop_table),
    ("ban-drop-column", ban_drop_column),
    ("ban-truncate-cascade", ban_truncate_cascade),
    ("adding-required-field", adding_required_field),
    ("unbounded-mutation", unbounded_mutation),
    ("prefer-explicit-columns", prefer_explicit_columns),
];

fn span(tokens: &[&Token]) -> Option<TextRange> {
    Some(TextRange::new(tokens.first()?.start, tokens.last()?.end))
}

fn any_statement(context: &LintContext, f: impl Fn(&Statement) -> bool) -> bool {
    context.tree.statements().iter().any(f)
}

/// Comma separated operations following `ALTER TABLE [IF EXISTS] [ONLY] name`,
/// without the terminating `;`.
fn alter_operations<'t>(top: &'t [&'t Token]) -> Vec<&'t [&'t Token]> {
    use Keyword::*;
    let mut i = 0;
    while top
        .get(i)
        .is_some_and(|t| matches!(t.keyword(), Some(Alter | Table | If | Exists | Only)))
    {
        i += 1;
    }
    if top.get(i).is_some_and(|t| t.name().is_some()) {
        i += 1;
        while top.get(i).is_some_and(|t| t.kind == TokenKind::Dot)
            && top.get(i + 1).is_some_and(|t| t.name().is_some())
        {
            i += 2;
        }
    }
    top.get(i..)
        .unwrap_or_default()
        .split(|t| matches!(t.kind, TokenKind::Comma | TokenKind::Semicolon))
        .filter(|op| !op.is_empty())
        .collect()
}

/// `ADD x` / `DROP x` where `x` is a column rather than a constraint.
fn targets_column(op: &[&Token], verb: Keyword) -> bool {
    let Some((first, rest)) = op.split_first() else {
        return false;
    };
    if !first.is_keyword(verb) {
        return false;
    }
    rest.first().is_some_and(|t| {
        t.is_keyword(Keyword::Column) || t.is_keyword(Keyword::If) || t.name().is_some()
    })
}

fn alter_table_ops(
    context: &LintContext,
    verb: Keyword,
    severity: Severity,
    rule: &str,
    message: &str,
) -> Vec<Diagnostic> {
    if !any_statement(context, |s| matches!(s, Statement::AlterTable { .. })) {
        return Vec::new();
    }
    let top = context.top_level();
    alter_operations(&top)
        .into_iter()
        .filter(|op| targets_column(op, verb))
        .filter(|op| verb != Keyword::Add || requires_value(op))
        .filter_map(span)
        .map(|range| Diagnostic::lint(rule, severity, range, message))
        .collect()
}

/// Column definition carrying `NOT NULL` and no `DEFAULT`.
fn requires_value(op: &[&Token]) -> bool {
    let not_null = op
        .windows(2)
        .any(|w| w[0].is_keyword(Keyword::Not) && w[1].is_keyword(Keyword::Null));
    not_null && !op.iter().any(|t| t.is_keyword(Keyword::Default))
}

pub fn ban_drop_table(context: &LintContext) -> Vec<Diagnostic> {
    let drops = context
        .tree
        .statements()
        .iter()
        .any(|s| matches!(s, Statement::Drop { object_type: ObjectType::Table, .. }));
    if !drops {
        return Vec::new();
    }
    let top = context.top_level();
    let range = top
        .iter()
        .position(|t| t.is_keyword(Keyword::Table))
        .and_then(|end| span(&top[..=end]))
        .unwrap_or_else(|| context.content_range());
    vec![Diagnostic::lint(
        "ban-drop-table",
        Severity::Warning,
        range,
        "dropping a table discards its data",
    )]
}

pub fn ban_drop_column(context: &LintContext) -> Vec<Diagnostic> {
    alter_table_ops(
        context,
        Keyword::Drop,
        Severity::Warning,
        "ban-drop-column",
        "dropping a column discards its data",
    )
}

pub fn adding_required_field(context: &LintContext) -> Vec<Diagnostic> {
    alter_table_ops(
        context,
        Keyword::Add,
        Severity::Error,
        "adding-required-field",
        "adding a NOT NULL column without a DEFAULT fails on tables that have rows",
    )
}

pub fn ban_truncate_cascade(context: &LintContext) -> Vec<Diagnostic> {
    if !any_statement(context, |s| matches!(s, Statement::Truncate { .. })) {
        return Vec::new();
    }
    context
        .top_level()
        .into_iter()
        .filter(|t| t.is_keyword(Keyword::Cascade))
        .map(|t| {
            Diagnostic::lint(
                "ban-truncate-cascade",
                Severity::Warning,
                TextRange::new(t.start, t.end),
                "TRUNCATE CASCADE also empties every table referencing this one",
            )
        })
        .collect()
}

pub fn unbounded_mutation(context: &LintContext) -> Vec<Diagnostic> {
    let verb = if any_statement(context, |s| matches!(s, Statement::Update { .. })) {
        Keyword::Update
    } else if any_statement(context, |s| matches!(s, Statement::Delete { .. })) {
        Keyword::Delete
    } else {
        return Vec::new();
    };
    let top = context.top_level();
    if top.iter().any(|t| t.is_keyword(Keyword::Where)) {
        return Vec::new();
    }
    let range = top
        .iter()
        .find(|t| t.is_keyword(verb))
        .map(|t| TextRange::new(t.start, t.end))
        .unwrap_or_else(|| context.content_range());
    vec![Diagnostic::lint(
        "unbounded-mutation",
        Severity::Warning,
        range,
        format!("{} without WHERE affects every row", verb.as_str().to_uppercase()),
    )]
}

pub fn prefer_explicit_columns(context: &LintContext) -> Vec<Diagnostic> {
    let wildcard = any_statement(context, |s| match s {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) => select
                .projection
                .iter()
                .any(|item| matches!(item, SelectItem::Wildcard(_))),
            _ => false,
        },
        _ => false,
    });
    if !wildcard {
        return Vec::new();
    }
    let top = context.top_level();
    let range = top
        .windows(2)
        .find(|w| {
            w[1].kind == TokenKind::Other('*')
                && (w[0].kind == TokenKind::Comma
                    || matches!(w[0].keyword(), Some(Keyword::Select | Keyword::Distinct | Keyword::All)))
        })
        .map(|w| TextRange::new(w[1].start, w[1].end))
        .unwrap_or_else(|| context.content_range());
    vec![Diagnostic::lint(
        "prefer-explicit-columns",
        Severity::Info,
        range,
        "list the selected columns instead of *",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(rule: LintRule, sql: &str) -> Vec<(String, TextRange)> {
        let tree = PgStrictParser.parse(sql).expect("valid sql");
        let context = LintContext::new(sql, &tree);
        rule(&context)
            .into_iter()
            .map(|d| (d.rule.unwrap_or_default(), d.range))
            .collect()
    }

    fn ranges(rule: LintRule, sql: &str) -> Vec<TextRange> {
        lint(rule, sql).into_iter().map(|(_, range)| range).collect()
    }

    #[rstest]
    #[case("drop table users;", vec![TextRange::new(0, 10)])]
    #[case("drop table if exists a, b;", vec![TextRange::new(0, 10)])]
    #[case("drop view users;", vec![])]
    #[case("select 1;", vec![])]
    fn drop_table(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(ban_drop_table, sql), expected);
    }

    #[rstest]
    #[case("alter table t drop column a;", vec![TextRange::new(14, 27)])]
    #[case("alter table t drop column a", vec![TextRange::new(14, 27)])]
    #[case("alter table t drop column a ; -- done\n", vec![TextRange::new(14, 27)])]
    #[case("alter table s.t drop a, drop column if exists b;", vec![TextRange::new(16, 22), TextRange::new(24, 47)])]
    #[case("alter table t drop constraint t_pkey;", vec![])]
    #[case("alter table t add column a int;", vec![])]
    fn drop_column(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(ban_drop_column, sql), expected);
    }

    #[rstest]
    #[case("alter table t add column a int not null;", vec![TextRange::new(14, 39)])]
    #[case("alter table t add b int, add column a int not null;\n", vec![TextRange::new(25, 50)])]
    #[case("alter table t add a numeric(10, 2) not null;", vec![TextRange::new(14, 43)])]
    #[case("alter table t add column a int not null default 0;", vec![])]
    #[case("alter table t add column a int;", vec![])]
    #[case("alter table t add constraint c check (a is not null);", vec![])]
    fn required_field(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(adding_required_field, sql), expected);
    }

    #[rstest]
    #[case("truncate t cascade;", vec![TextRange::new(11, 18)])]
    #[case("truncate t;", vec![])]
    fn truncate_cascade(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(ban_truncate_cascade, sql), expected);
    }

    #[rstest]
    #[case("delete from t;", vec![TextRange::new(0, 6)])]
    #[case("update t set a = 1;", vec![TextRange::new(0, 6)])]
    #[case("update t set a = (select b from u where u.id = 1);", vec![TextRange::new(0, 6)])]
    #[case("delete from t where id = 1;", vec![])]
    #[case("update t set a = 1 where id = 2;", vec![])]
    #[case("select * from t;", vec![])]
    fn mutation_without_where(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(unbounded_mutation, sql), expected);
    }

    #[rstest]
    #[case("select * from t;", vec![TextRange::new(7, 8)])]
    #[case("select a, * from t;", vec![TextRange::new(10, 11)])]
    #[case("select count(*) from t;", vec![])]
    #[case("select t.* from t;", vec![])]
    #[case("select a from t;", vec![])]
    fn explicit_columns(#[case] sql: &str, #[case] expected: Vec<TextRange>) {
        assert_eq!(ranges(prefer_explicit_columns, sql), expected);
    }

    #[test]
    fn diagnostics_carry_the_rule_id() {
        let found = lint(unbounded_mutation, "delete from t");
        assert_eq!(found[0].0, "unbounded-mutation");
    }
}
