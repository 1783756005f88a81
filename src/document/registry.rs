use crate::*;
use std::collections::{HashMap, VecDeque};

/// A statement that appeared during an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedStatement {
    pub id: StatementId,
    /// Set when the statement replaced exactly one old statement that fully
    /// contained the edit: the old id plus the edit relative to the old
    /// statement's start, so its tolerant tree can be reparsed.
    pub predecessor: Option<(StatementId, TextEdit)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub retired: Vec<StatementId>,
    pub created: Vec<CreatedStatement>,
    /// Statements after the edit whose range moved without any other change.
    pub shifted: usize,
}

impl EditOutcome {
    pub fn is_identity_preserving(&self) -> bool {
        self.retired.is_empty() && self.created.is_empty()
    }
}

/// Document text plus its statements.
///
/// Statements live in an arena indexed by id. Retired statements leave a
/// tombstone so ids are never reused; `order` lists the live ids by range.
#[derive(Debug, Clone)]
pub struct Document {
    key: DocumentKey,
    text: String,
    arena: Vec<Option<Statement>>,
    order: Vec<StatementId>,
}

impl Document {
    pub fn open(key: impl Into<DocumentKey>, text: impl Into<String>) -> Self {
        let mut document = Self {
            key: key.into(),
            text: text.into(),
            arena: Vec::new(),
            order: Vec::new(),
        };
        for range in splitter::split(&document.text) {
            let id = document.allocate(range);
            document.order.push(id);
        }
        debug!(
            document = %document.key,
            statements = document.order.len(),
            "Opened document"
        );
        document
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn get(&self, id: StatementId) -> Option<&Statement> {
        self.arena.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn statement_key(&self, id: StatementId) -> StatementKey {
        StatementKey::new(self.key.clone(), id)
    }

    /// Live statements in range order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Statement covering byte `offset`.
    pub fn statement_at(&self, offset: usize) -> Option<&Statement> {
        let index = self.index_at(offset)?;
        self.get(self.order[index])
    }

    /// Statement a cursor at `offset` edits. A cursor right behind the last
    /// token of an unterminated statement still belongs to that statement.
    pub fn statement_at_cursor(&self, offset: usize) -> Option<&Statement> {
        let index = self.index_at(offset)?;
        let current = self.get(self.order[index])?;
        if index > 0 && offset == current.range.start {
            let previous = self.get(self.order[index - 1])?;
            let ends_in_token = previous
                .text
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_whitespace());
            if ends_in_token && !previous.is_terminated() {
                return Some(previous);
            }
        }
        Some(current)
    }

    fn index_at(&self, offset: usize) -> Option<usize> {
        if offset > self.text.len() {
            return None;
        }
        let index = self
            .order
            .partition_point(|id| self.get(*id).is_some_and(|s| s.range.end <= offset));
        Some(index.min(self.order.len().saturating_sub(1)))
    }

    fn allocate(&mut self, range: TextRange) -> StatementId {
        let id = StatementId(self.arena.len() as u64);
        let statement = Statement::new(id, range, &self.text[range.start..range.end]);
        self.arena.push(Some(statement));
        id
    }

    /// Whether the boundary at `start` survives an edit at `edit_start`. The
    /// boundary is decided by the first two tokens from there, and lexing
    /// those reads up to [`sql::MAX_LOOKAHEAD`] characters beyond.
    fn start_is_settled(&self, start: usize, edit_start: usize) -> bool {
        let Some(second) = sql::Tokenizer::starting_at(&self.text, start).nth(1) else {
            return false;
        };
        second.end <= edit_start
            && self.text[second.end..edit_start].chars().count() >= sql::MAX_LOOKAHEAD
    }

    fn range_of(&self, index: usize) -> TextRange {
        self.get(self.order[index])
            .map(|s| s.range)
            .unwrap_or_default()
    }

    /// Apply `edit`, re-splitting only the statements it touches.
    ///
    /// Statements before the edit are untouched, statements after it are
    /// shifted. The touched ones are re-split together with one neighbour on
    /// each side; the window grows until both neighbours come out of the
    /// re-split unchanged. The right neighbour is judged with the start of
    /// the statement after it in view, so the boundaries outside the window
    /// still hold. New ranges are matched against the old ones by content
    /// hash to keep identities.
    pub fn apply_edit(&mut self, edit: &TextEdit) -> Result<EditOutcome> {
        if !edit.fits(&self.text) {
            return Err(Error::EditConflict {
                key: self.key.clone(),
                start: edit.range.start,
                end: edit.range.end,
                len: self.text.len(),
            });
        }

        let delta = edit.delta();
        let new_text = edit.apply(&self.text);
        let count = self.order.len();

        let first = self
            .order
            .partition_point(|id| self.get(*id).is_some_and(|s| s.range.end < edit.range.start))
            .min(count - 1);
        let last = self
            .order
            .partition_point(|id| self.get(*id).is_some_and(|s| s.range.start <= edit.range.end))
            .saturating_sub(1)
            .max(first);

        let mut lo = first.saturating_sub(1);
        let mut hi = (last + 1).min(count - 1);
        let mut step = 1;
        let fresh = loop {
            let start = self.range_of(lo).start;
            let end = self.range_of(hi).end.saturating_add_signed(delta);
            let last_window = hi == count - 1;
            // Boundaries are decided with one token of lookahead, so the
            // window reads two tokens into the statement after it.
            let lookahead = if last_window {
                end
            } else {
                sql::Tokenizer::starting_at(&new_text, end)
                    .take(2)
                    .last()
                    .map_or(end, |token| token.end)
            };
            let mut fresh: Vec<TextRange> = splitter::split(&new_text[start..lookahead])
                .into_iter()
                .map(|r| r.shift(start as isize))
                .collect();

            let left_stable = lo == 0
                || (fresh.first() == Some(&self.range_of(lo))
                    && self.start_is_settled(self.range_of(lo).start, edit.range.start));
            let right_stable = if last_window {
                true
            } else if let Some(at) = fresh.iter().position(|r| *r == self.range_of(hi).shift(delta)) {
                fresh.truncate(at + 1);
                true
            } else {
                false
            };
            if left_stable && right_stable {
                break fresh;
            }
            if !left_stable {
                lo = lo.saturating_sub(step);
            }
            if !right_stable {
                hi = (hi + step).min(count - 1);
            }
            step *= 2;
        };

        let old: Vec<Statement> = self.order[lo..=hi]
            .iter()
            .filter_map(|id| self.get(*id).cloned())
            .collect();
        let mut by_hash: HashMap<u64, VecDeque<StatementId>> = HashMap::new();
        for statement in &old {
            by_hash
                .entry(statement.content_hash)
                .or_default()
                .push_back(statement.id);
        }

        self.text = new_text;
        let mut outcome = EditOutcome::default();
        let mut ids = Vec::with_capacity(fresh.len());
        for range in fresh {
            let hash = content_hash(&self.text[range.start..range.end]);
            let reused = by_hash.get_mut(&hash).and_then(VecDeque::pop_front);
            match reused.and_then(|id| self.arena[id.0 as usize].as_mut()) {
                Some(statement) => {
                    if statement.range != range {
                        statement.range = range;
                        outcome.shifted += 1;
                    }
                    ids.push(statement.id);
                }
                None => {
                    let id = self.allocate(range);
                    outcome.created.push(CreatedStatement {
                        id,
                        predecessor: None,
                    });
                    ids.push(id);
                }
            }
        }

        for statement in &old {
            if !ids.contains(&statement.id) {
                self.arena[statement.id.0 as usize] = None;
                outcome.retired.push(statement.id);
            }
        }

        if let ([created], [retired]) = (outcome.created.as_mut_slice(), outcome.retired.as_slice())
            && let Some(previous) = old.iter().find(|s| s.id == *retired)
            && let Some(current) = self.arena[created.id.0 as usize].as_ref()
            && previous.range.start <= edit.range.start
            && edit.range.end <= previous.range.end
            && previous.range.start == current.range.start
        {
            created.predecessor = Some((previous.id, edit.relative_to(previous.range.start)));
        }

        for id in &self.order[hi + 1..] {
            if let Some(statement) = self.arena[id.0 as usize].as_mut() {
                statement.range = statement.range.shift(delta);
                outcome.shifted += 1;
            }
        }
        self.order.splice(lo..=hi, ids);

        trace!(
            document = %self.key,
            edit = %edit.range,
            created = outcome.created.len(),
            retired = outcome.retired.len(),
            shifted = outcome.shifted,
            "Applied edit"
        );
        Ok(outcome)
    }
}
