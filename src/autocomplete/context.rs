use crate::*;
use sql::{Token, TokenKind};

/// What the cursor is positioned in, as far as completion cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionContext {
    /// Clause the cursor is in, `None` before the first clause keyword.
    pub clause: Option<ClauseKind>,
    /// Name before a `.` directly in front of the cursor word.
    pub qualifier: Option<String>,
    /// Part of the word typed up to the cursor.
    pub prefix: String,
    /// Relations named by the cursor's own scope.
    pub relations: Vec<Relation>,
    /// Relations of enclosing scopes, reachable by qualifier.
    pub outer_relations: Vec<Relation>,
}

fn is_word(token: &Token) -> bool {
    token.kind.is_ident() || token.keyword().is_some()
}

impl CompletionContext {
    /// Context at `offset`, relative to the statement the tree was built from.
    pub fn at(tree: &TolerantTree, offset: usize) -> Self {
        let text = tree.text();
        let offset = offset.min(text.len());
        let tokens = tree.tokens();
        let before = tokens.partition_point(|t| t.end < offset);

        let mut word_start = offset;
        let mut prefix = String::new();
        let mut index = before;
        if let Some(token) = tokens.get(before)
            && token.start < offset
            && is_word(token)
        {
            prefix = text[token.start..offset].trim_start_matches('"').to_string();
            word_start = token.start;
        } else {
            index = tokens.partition_point(|t| t.end <= offset);
        }

        let mut qualifier = None;
        if index >= 2
            && tokens[index - 1].kind == TokenKind::Dot
            && tokens[index - 1].end == word_start
            && let Some(name) = tokens[index - 2].name()
        {
            qualifier = Some(name.to_string());
            word_start = tokens[index - 2].start;
        }

        let scope = tree.scope_at(word_start);
        let relations = scope.relations.clone();
        let outer_relations = tree
            .visible_relations(scope)
            .into_iter()
            .skip(relations.len())
            .cloned()
            .collect();
        Self {
            clause: scope.clause_at(word_start).map(|c| c.kind),
            qualifier,
            prefix,
            relations,
            outer_relations,
        }
    }

    pub fn all_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().chain(&self.outer_relations)
    }
}
