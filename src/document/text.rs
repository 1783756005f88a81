/// Half-open byte range `[start, end)` into a document or statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, derive_more::Display)]
#[display("{start}..{end}")]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// End exclusive.
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Like `contains`, but a cursor sitting right after the last byte counts.
    pub const fn contains_inclusive(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    /// True if the ranges overlap or touch.
    pub const fn touches(&self, other: &TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn shift(&self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }

    /// Range relative to `origin`, which must not exceed `start`.
    pub fn relative_to(&self, origin: usize) -> Self {
        Self {
            start: self.start - origin,
            end: self.end - origin,
        }
    }

    pub fn cover(&self, other: &TextRange) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Replace `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub text: String,
}

impl TextEdit {
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(at), text)
    }

    /// Net length change caused by the edit.
    pub fn delta(&self) -> isize {
        self.text.len() as isize - self.range.len() as isize
    }

    /// Whether the edit may be applied to `text` as is.
    pub fn fits(&self, text: &str) -> bool {
        self.range.start <= self.range.end
            && self.range.end <= text.len()
            && text.is_char_boundary(self.range.start)
            && text.is_char_boundary(self.range.end)
    }

    /// Apply to `text`. The caller guarantees `fits(text)`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len().saturating_add_signed(self.delta()));
        out.push_str(&text[..self.range.start]);
        out.push_str(&self.text);
        out.push_str(&text[self.range.end..]);
        out
    }

    /// The same edit expressed relative to `origin`.
    pub fn relative_to(&self, origin: usize) -> Self {
        Self {
            range: self.range.relative_to(origin),
            text: self.text.clone(),
        }
    }
}
