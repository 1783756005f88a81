//! Error tolerant clause tree.
//!
//! The tree is deliberately shallow: a statement is a list of scopes (the
//! statement itself plus one per parenthesized sub-query), each holding the
//! clauses it contains and the relations its `FROM`-like clauses name. That
//! is all completion needs and it can be built from any token stream.
use crate::*;
use sql::{Keyword, MAX_LOOKAHEAD, Token, TokenKind, Tokenizer, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Values,
    Create,
    Alter,
    Drop,
    Truncate,
    /// Any other statement keyword (`SET`, `EXPLAIN`, `GRANT`, ...).
    Utility,
    /// Text that does not start with a statement keyword.
    Unknown,
    /// Whitespace and comments only.
    Empty,
}

impl StatementKind {
    fn of(kw: Keyword) -> Self {
        use Keyword::*;
        match kw {
            Select | With => Self::Select,
            Insert => Self::Insert,
            Update => Self::Update,
            Delete => Self::Delete,
            Merge => Self::Merge,
            Values => Self::Values,
            Create => Self::Create,
            Alter => Self::Alter,
            Drop => Self::Drop,
            Truncate => Self::Truncate,
            _ if splitter::binding::opener(kw).is_some() => Self::Utility,
            _ => Self::Unknown,
        }
    }

    fn is_ddl(self) -> bool {
        matches!(self, Self::Create | Self::Alter | Self::Drop | Self::Truncate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ClauseKind {
    /// Projection list of a `SELECT`.
    Select,
    From,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    /// Table after `INSERT INTO` / `MERGE INTO`.
    InsertTarget,
    /// Table after a leading `UPDATE`.
    UpdateTarget,
    /// Object after `CREATE TABLE`, `DROP TABLE`, `TRUNCATE`, ...
    Table,
    Set,
    Values,
    Using,
    Returning,
    Other,
}

impl ClauseKind {
    /// Clauses whose names are relations.
    pub fn names_relations(self) -> bool {
        matches!(
            self,
            Self::From | Self::Join | Self::Using | Self::InsertTarget | Self::UpdateTarget | Self::Table
        )
    }

    /// Clauses holding value expressions.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::On
                | Self::Where
                | Self::GroupBy
                | Self::Having
                | Self::OrderBy
                | Self::Set
                | Self::Values
                | Self::Returning
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    /// Span of the keyword that opened the clause.
    pub range: TextRange,
}

/// A table named by a relation clause, e.g. `public.users AS u`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl Relation {
    /// Name the relation is referred to by in the rest of the query.
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: StatementKind,
    /// Text covered by the scope, without its parentheses.
    pub range: TextRange,
    pub parent: Option<usize>,
    pub clauses: Vec<Clause>,
    pub relations: Vec<Relation>,
}

impl Scope {
    fn new(kind: StatementKind, start: usize, end: usize, parent: Option<usize>) -> Self {
        Self {
            kind,
            range: TextRange::new(start, end),
            parent,
            clauses: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Clause a cursor at `offset` is in: the last one whose keyword ends
    /// before the cursor.
    pub fn clause_at(&self, offset: usize) -> Option<&Clause> {
        self.clauses.iter().rev().find(|c| c.range.end < offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TolerantTree {
    text: String,
    tokens: Vec<Token>,
    /// Index 0 is the statement itself; children follow their parents.
    scopes: Vec<Scope>,
}

impl TolerantTree {
    fn build(text: String, tokens: Vec<Token>) -> Self {
        let scopes = TreeBuilder::new(&text, &tokens).run();
        Self {
            text,
            tokens,
            scopes,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn kind(&self) -> StatementKind {
        self.root().kind
    }

    /// Innermost scope containing `offset`.
    pub fn scope_at(&self, offset: usize) -> &Scope {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.range.contains_inclusive(offset) && s.parent.is_some())
            .unwrap_or(self.root())
    }

    /// Relations visible from `scope`: its own plus those of enclosing scopes.
    pub fn visible_relations<'a>(&'a self, scope: &'a Scope) -> Vec<&'a Relation> {
        let mut out: Vec<&Relation> = scope.relations.iter().collect();
        let mut parent = scope.parent;
        while let Some(index) = parent {
            let outer = &self.scopes[index];
            out.extend(outer.relations.iter());
            parent = outer.parent;
        }
        out
    }
}

/// Builds the scope list from a token stream in one pass.
struct TreeBuilder<'a> {
    tokens: &'a [Token],
    len: usize,
    scopes: Vec<Scope>,
    /// Open scopes with the paren depth inside each.
    stack: Vec<(usize, usize)>,
    /// The current relation clause still expects a name.
    expecting: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str, tokens: &'a [Token]) -> Self {
        let kind = match tokens.iter().find(|t| t.kind != TokenKind::ParenOpen) {
            None => StatementKind::Empty,
            Some(token) => token.keyword().map(StatementKind::of).unwrap_or(StatementKind::Unknown),
        };
        Self {
            tokens,
            len: text.len(),
            scopes: vec![Scope::new(kind, 0, text.len(), None)],
            stack: vec![(0, 0)],
            expecting: false,
        }
    }

    fn current_index(&self) -> usize {
        self.stack.last().map(|(i, _)| *i).unwrap_or(0)
    }

    fn current(&mut self) -> &mut Scope {
        let index = self.current_index();
        &mut self.scopes[index]
    }

    fn nesting(&self) -> usize {
        self.stack.last().map(|(_, depth)| *depth).unwrap_or(0)
    }

    fn set_nesting(&mut self, depth: usize) {
        if let Some(top) = self.stack.last_mut() {
            top.1 = depth;
        }
    }

    fn run(mut self) -> Vec<Scope> {
        let mut i = 0;
        while i < self.tokens.len() {
            i = self.step(i);
        }
        self.scopes
    }

    fn step(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let token = &tokens[i];
        match &token.kind {
            TokenKind::ParenOpen => {
                let subquery = tokens
                    .get(i + 1)
                    .and_then(Token::keyword)
                    .filter(|k| matches!(k, Keyword::Select | Keyword::With | Keyword::Values));
                self.expecting = false;
                match subquery {
                    Some(kw) => {
                        let parent = Some(self.current_index());
                        self.scopes
                            .push(Scope::new(StatementKind::of(kw), token.end, self.len, parent));
                        self.stack.push((self.scopes.len() - 1, 0));
                    }
                    None => self.set_nesting(self.nesting() + 1),
                }
            }
            TokenKind::ParenClose => {
                if self.nesting() == 0 && self.stack.len() > 1 {
                    if let Some((index, _)) = self.stack.pop() {
                        self.scopes[index].range.end = token.start;
                    }
                } else {
                    self.set_nesting(self.nesting().saturating_sub(1));
                }
            }
            _ if self.nesting() > 0 => {}
            TokenKind::Comma => {
                let in_from = self
                    .current()
                    .clauses
                    .last()
                    .is_some_and(|c| matches!(c.kind, ClauseKind::From | ClauseKind::Table));
                self.expecting = in_from;
            }
            TokenKind::Keyword(kw) => return self.keyword(i, *kw),
            TokenKind::Ident(_) | TokenKind::QuotedIdent(_) if self.expecting => {
                return self.relation(i);
            }
            _ => {}
        }
        i + 1
    }

    fn keyword(&mut self, i: usize, kw: Keyword) -> usize {
        use Keyword::*;
        let tokens = self.tokens;
        let next = tokens.get(i + 1).and_then(Token::keyword);
        let kind = self.scopes[self.current_index()].kind;
        let has_update_target = self.scopes[self.current_index()]
            .clauses
            .iter()
            .any(|c| c.kind == ClauseKind::UpdateTarget);
        let clause = match kw {
            Select => Some(ClauseKind::Select),
            From => Some(ClauseKind::From),
            Join => Some(ClauseKind::Join),
            On if kind.is_ddl() => Some(ClauseKind::Table),
            On => Some(ClauseKind::On),
            Where => Some(ClauseKind::Where),
            Group if next == Some(By) => Some(ClauseKind::GroupBy),
            Order if next == Some(By) => Some(ClauseKind::OrderBy),
            Having => Some(ClauseKind::Having),
            Limit | Offset => Some(ClauseKind::Limit),
            Into if matches!(kind, StatementKind::Insert | StatementKind::Merge) => {
                Some(ClauseKind::InsertTarget)
            }
            Update if kind == StatementKind::Update && !has_update_target => {
                Some(ClauseKind::UpdateTarget)
            }
            Set => Some(ClauseKind::Set),
            Values => Some(ClauseKind::Values),
            Using => Some(ClauseKind::Using),
            Returning => Some(ClauseKind::Returning),
            Table if kind.is_ddl() => Some(ClauseKind::Table),
            Truncate => Some(ClauseKind::Table),
            Union | Intersect | Except | Window => Some(ClauseKind::Other),
            _ => None,
        };
        // A `WITH` statement takes the kind of its main statement.
        if kind == StatementKind::Select
            && self.current().clauses.is_empty()
            && matches!(kw, Insert | Update | Delete | Merge)
        {
            self.current().kind = StatementKind::of(kw);
            if kw == Update {
                self.push_clause(ClauseKind::UpdateTarget, i);
                return i + 1;
            }
        }
        if let Some(clause) = clause {
            self.push_clause(clause, i);
        } else if !matches!(kw, Only | Lateral | If | Not | Exists | Table | Cascade) {
            // Modifiers keep a relation clause expecting its name.
            self.expecting = false;
        }
        i + 1
    }

    fn push_clause(&mut self, kind: ClauseKind, i: usize) {
        let token = &self.tokens[i];
        let range = TextRange::new(token.start, token.end);
        self.current().clauses.push(Clause { kind, range });
        self.expecting = kind.names_relations();
    }

    /// Read `[schema.]name [[AS] alias]` starting at token `i`.
    fn relation(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let name_at = |at: usize| tokens.get(at).and_then(Token::name);
        let mut end = i + 1;
        let mut relation = Relation {
            schema: None,
            name: name_at(i).unwrap_or_default().to_string(),
            alias: None,
        };
        if tokens.get(end).is_some_and(|t| t.kind == TokenKind::Dot)
            && let Some(name) = name_at(end + 1)
        {
            relation.schema = Some(std::mem::replace(&mut relation.name, name.to_string()));
            end += 2;
        }
        if tokens.get(end).is_some_and(|t| t.is_keyword(Keyword::As)) {
            if let Some(alias) = name_at(end + 1) {
                relation.alias = Some(alias.to_string());
                end += 2;
            }
        } else if let Some(alias) = name_at(end) {
            relation.alias = Some(alias.to_string());
            end += 1;
        }
        self.current().relations.push(relation);
        self.expecting = false;
        end
    }
}

/// Parser that never fails and can update a tree after an edit.
///
/// Only lexing is incremental: `reparse` reuses the tokens the edit cannot
/// reach and rebuilds every scope from the merged token stream.
pub trait TolerantParser: Send + Sync {
    fn parse(&self, sql: &str) -> TolerantTree;

    fn reparse(&self, tree: &TolerantTree, edit: &TextEdit) -> TolerantTree;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LenientParser;

impl TolerantParser for LenientParser {
    fn parse(&self, sql: &str) -> TolerantTree {
        TolerantTree::build(sql.to_string(), tokenize(sql))
    }

    /// Re-lex from the last token whose lexing could not have read the edited
    /// text until the new stream lines up with the old one again, then reuse
    /// the shifted old tokens.
    fn reparse(&self, tree: &TolerantTree, edit: &TextEdit) -> TolerantTree {
        if !edit.fits(&tree.text) {
            warn!(edit = %edit.range, len = tree.text.len(), "Edit does not fit the tree, keeping it");
            return tree.clone();
        }
        let text = edit.apply(&tree.text);
        let delta = edit.delta();
        let old = &tree.tokens;

        // A token is settled when the lexer's peek past its end stops short of the edit.
        let settled = old.partition_point(|t| t.end + MAX_LOOKAHEAD < edit.range.start);
        let restart = settled.saturating_sub(1);
        let mut tokens: Vec<Token> = old[..restart].to_vec();
        let offset = if restart == 0 { 0 } else { old[restart].start };

        let edited_end = edit.range.start + edit.text.len();
        let mut candidate = old.partition_point(|t| t.start < edit.range.end);
        for token in Tokenizer::starting_at(&text, offset) {
            if token.start >= edited_end {
                while old
                    .get(candidate)
                    .is_some_and(|t| t.start.saturating_add_signed(delta) < token.start)
                {
                    candidate += 1;
                }
                if let Some(previous) = old.get(candidate)
                    && previous.shifted(delta) == token
                {
                    tokens.extend(old[candidate..].iter().map(|t| t.shifted(delta)));
                    return TolerantTree::build(text, tokens);
                }
            }
            tokens.push(token);
        }
        TolerantTree::build(text, tokens)
    }
}
