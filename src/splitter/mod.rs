//! Statement splitting.
//!
//! [`split`] partitions a document into statement ranges. The ranges are
//! ordered, never overlap and together cover the whole text, so every byte
//! offset belongs to exactly one statement.
//!
//! Two strategies cooperate:
//! - a precedence scan over the token stream (see [`binding`]) that decides,
//!   for every statement keyword at paren depth 0, whether it continues the
//!   open statement or begins a new one;
//! - a textual fallback for text the scan cannot classify, which runs up to
//!   the next `;` or blank line (see [`fallback`]).
//!
//! Whitespace and comments between statements belong to the statement before
//! them; leading trivia belongs to the first statement.
pub mod binding;
pub mod fallback;

use crate::TextRange;
use crate::sql::{Keyword, Token, TokenKind, tokenize};

/// Split `sql` into statement ranges. Never returns an empty vector: text
/// without any token yields a single range covering all of it.
pub fn split(sql: &str) -> Vec<TextRange> {
    let tokens = tokenize(sql);
    let starts = Scanner::new(sql, &tokens).run();
    ranges(sql.len(), &starts)
}

fn ranges(len: usize, starts: &[usize]) -> Vec<TextRange> {
    if starts.is_empty() {
        return vec![TextRange::new(0, len)];
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let begin = if i == 0 { 0 } else { *start };
            let end = starts.get(i + 1).copied().unwrap_or(len);
            TextRange::new(begin, end)
        })
        .collect()
}

/// State of the statement currently being scanned.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    /// Keyword that opened the statement, `None` for a leading `(`.
    pub(crate) head: Option<Keyword>,
    /// Latest statement keyword absorbed at depth 0.
    pub(crate) last: Option<Keyword>,
    depth: usize,
    /// `CASE .. END` and `BEGIN ATOMIC .. END` nesting.
    blocks: usize,
    /// A `WITH` list was seen and its main statement has not started yet.
    pub(crate) cte_pending: bool,
    /// An `INSERT` still waits for its `SELECT` / `VALUES` body.
    pub(crate) awaiting_query: bool,
    pub(crate) inserting: bool,
    /// `CREATE FUNCTION` / `CREATE PROCEDURE`.
    pub(crate) routine: bool,
    prev: Option<usize>,
}

impl Frame {
    pub(crate) fn open(head: Option<Keyword>) -> Self {
        let mut frame = Self {
            head,
            last: None,
            depth: 0,
            blocks: 0,
            cte_pending: false,
            awaiting_query: false,
            inserting: false,
            routine: false,
            prev: None,
        };
        if let Some(kw) = head {
            frame.absorb(kw);
        }
        frame
    }

    fn absorb(&mut self, kw: Keyword) {
        use Keyword::*;
        match kw {
            With => self.cte_pending = true,
            Insert => {
                self.cte_pending = false;
                self.awaiting_query = true;
                self.inserting = true;
            }
            Select | Values => {
                self.cte_pending = false;
                self.awaiting_query = false;
            }
            Update | Delete | Merge => self.cte_pending = false,
            _ => {}
        }
        self.last = Some(kw);
    }

    fn nested(&self) -> bool {
        self.depth > 0 || self.blocks > 0
    }
}

struct Scanner<'a> {
    sql: &'a str,
    tokens: &'a [Token],
    starts: Vec<usize>,
    frame: Option<Frame>,
}

impl<'a> Scanner<'a> {
    fn new(sql: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            sql,
            tokens,
            starts: Vec::new(),
            frame: None,
        }
    }

    fn run(mut self) -> Vec<usize> {
        let mut i = 0;
        while i < self.tokens.len() {
            if self.frame.is_none() {
                match &self.tokens[i].kind {
                    TokenKind::Semicolon => {
                        i += 1;
                        continue;
                    }
                    TokenKind::ParenOpen => self.open(i, None),
                    TokenKind::Keyword(k) if binding::opener(*k).is_some() => self.open(i, Some(*k)),
                    _ => {
                        let (start, end) = fallback::span(self.sql, self.tokens, i);
                        self.starts.push(start);
                        i = end;
                        continue;
                    }
                }
            }
            i = self.step(i);
        }
        self.starts
    }

    fn open(&mut self, i: usize, head: Option<Keyword>) {
        self.starts.push(self.tokens[i].start);
        self.frame = Some(Frame::open(head));
    }

    /// Feed token `i` to the open statement, returning the next index.
    fn step(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let token = &tokens[i];
        let Some(frame) = self.frame.as_mut() else {
            return i + 1;
        };

        match &token.kind {
            TokenKind::ParenOpen => frame.depth += 1,
            TokenKind::ParenClose if frame.depth == 0 => {
                // Unbalanced: the precedence scan has lost track, finish the
                // statement textually.
                let end = fallback::tail(self.sql, tokens, i);
                self.frame = None;
                return end;
            }
            TokenKind::ParenClose => frame.depth -= 1,
            TokenKind::Semicolon if !frame.nested() => {
                self.frame = None;
                return i + 1;
            }
            TokenKind::Keyword(Keyword::Case) => frame.blocks += 1,
            TokenKind::Keyword(Keyword::Begin)
                if frame.head == Some(Keyword::Create)
                    && tokens.get(i + 1).is_some_and(|t| t.is_keyword(Keyword::Atomic)) =>
            {
                frame.blocks += 1
            }
            TokenKind::Keyword(Keyword::End) if frame.blocks > 0 => frame.blocks -= 1,
            TokenKind::Keyword(Keyword::Function | Keyword::Procedure)
                if frame.head == Some(Keyword::Create) =>
            {
                frame.routine = true
            }
            TokenKind::Keyword(k)
                if frame.prev.is_some() && !frame.nested() && binding::opener(*k).is_some() =>
            {
                let prev = frame.prev.map(|p| &tokens[p].kind);
                let next = tokens.get(i + 1).map(|t| &t.kind);
                if binding::binds(frame, *k, prev, next) {
                    frame.absorb(*k);
                } else {
                    self.open(i, Some(*k));
                }
            }
            _ => {}
        }

        if let Some(frame) = self.frame.as_mut() {
            frame.prev = Some(i);
        }
        i + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn texts(sql: &str) -> Vec<&str> {
        split(sql).into_iter().map(|r| &sql[r.start..r.end]).collect()
    }

    fn assert_partition(sql: &str) {
        let ranges = split(sql);
        assert!(!ranges.is_empty());
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(sql.len()));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap or overlap in {ranges:?}");
        }
    }

    #[test]
    fn nested_query_does_not_create_a_boundary() {
        let sql = "SELECT a FROM (SELECT a FROM b) sub WHERE\nSELECT 1;";
        assert_eq!(
            texts(sql),
            vec!["SELECT a FROM (SELECT a FROM b) sub WHERE\n", "SELECT 1;"]
        );
    }

    #[test]
    fn garbage_falls_back_to_blank_lines() {
        let sql = "garbage text\n\nselect 1;";
        assert_eq!(texts(sql), vec!["garbage text\n\n", "select 1;"]);
    }

    #[test]
    fn garbage_falls_back_to_semicolons() {
        let sql = "not sql at all; select 1; more junk";
        assert_eq!(texts(sql), vec!["not sql at all; ", "select 1; ", "more junk"]);
    }

    #[test]
    fn empty_and_blank_documents_have_one_statement() {
        assert_eq!(split(""), vec![TextRange::new(0, 0)]);
        assert_eq!(split("  \n\t"), vec![TextRange::new(0, 4)]);
        assert_eq!(split("-- only a comment"), vec![TextRange::new(0, 17)]);
    }

    #[test]
    fn trivia_attaches_to_neighbours() {
        let sql = "\n\n  select 1;\n\n-- next\nselect 2;\n\n";
        assert_eq!(texts(sql), vec!["\n\n  select 1;\n\n-- next\n", "select 2;\n\n"]);
    }

    #[rstest]
    #[case("select 1 union all select 2", 1)]
    #[case("with x as (select 1) select * from x", 1)]
    #[case("with x as (select 1) insert into t select * from x", 1)]
    #[case("insert into t (a) select a from u", 1)]
    #[case("insert into t values (1) on conflict (a) do update set a = 2", 1)]
    #[case("insert into t values (1) on conflict do nothing", 1)]
    #[case("update t set a = 1 where b = 2", 1)]
    #[case("create view v as select 1", 1)]
    #[case("create materialized view v as select 1 with no data", 1)]
    #[case("explain analyze select 1", 1)]
    #[case("explain (analyze, buffers) select 1", 1)]
    #[case("select * from t for update", 1)]
    #[case("declare c cursor for select 1", 1)]
    #[case("create rule r as on insert to t do instead delete from u", 1)]
    #[case("create trigger tr after insert or update on t for each row execute function f()", 1)]
    #[case("create policy p on t for select using (true)", 1)]
    #[case("grant select, insert, update on t to r", 1)]
    #[case("alter table t drop column a, alter column b set default 1", 1)]
    #[case("alter table t add constraint fk foreign key (a) references b on delete set null", 1)]
    #[case("create function f() returns int language sql begin atomic select 1; select 2; end", 1)]
    #[case("merge into t using s on t.id = s.id when matched then update set a = 1 when not matched then insert (a) values (1)", 1)]
    #[case("select comment, close from t order by set", 1)]
    #[case("comment on table t is 'x'", 1)]
    #[case("select case when a then 1 else 2 end from t", 1)]
    #[case("select 1\nselect 2", 2)]
    #[case("drop table a\ndrop table b", 2)]
    #[case("alter table a add column x int\nalter table b add column y int", 2)]
    #[case("begin;\nselect 1;\ncommit;", 3)]
    #[case("select 1;;select 2", 2)]
    #[case("create table t (a int)\ninsert into t values (1)\nselect * from t", 3)]
    #[case("select 'a;b' ; select $$;$$", 2)]
    fn statement_counts(#[case] sql: &str, #[case] expected: usize) {
        assert_partition(sql);
        assert_eq!(split(sql).len(), expected, "{:?}", texts(sql));
    }

    #[rstest]
    #[case("")]
    #[case(";;;")]
    #[case(")))(((")]
    #[case("select (((")]
    #[case("select ) from t; select 1")]
    #[case("lorem ipsum\n\ndolor sit amet\n\n\n")]
    #[case("select 'unterminated")]
    #[case("/* unterminated comment")]
    #[case("ünïcödé — text; select 1")]
    fn arbitrary_input_is_partitioned(#[case] sql: &str) {
        assert_partition(sql);
    }

    #[test]
    fn unbalanced_close_paren_finishes_the_statement_textually() {
        let sql = "select ) from t; select 1";
        assert_eq!(texts(sql), vec!["select ) from t; ", "select 1"]);
    }
}
