use crate::TextRange;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Path-like key of an open document.
pub type DocumentKey = String;

/// Per-document statement identity. Allocated from a monotonically
/// increasing counter and never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("#{_0}")]
pub struct StatementId(pub u64);

/// Identity of a statement across the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{document}{id}")]
pub struct StatementKey {
    pub document: DocumentKey,
    pub id: StatementId,
}

impl StatementKey {
    pub fn new(document: impl Into<DocumentKey>, id: StatementId) -> Self {
        Self {
            document: document.into(),
            id,
        }
    }

    /// Cache key derived from the identity only. Text and range are left out
    /// so that a shifted statement keeps hitting its cached results.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.document.as_bytes());
        hasher.update(&[0]);
        hasher.update(&self.id.0.to_le_bytes());
        hasher.digest()
    }
}

pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub id: StatementId,
    /// Range within the document.
    pub range: TextRange,
    pub text: String,
    pub content_hash: u64,
}

impl Statement {
    pub fn new(id: StatementId, range: TextRange, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id,
            range,
            content_hash: content_hash(&text),
            text,
        }
    }

    /// True for whitespace and comment only text.
    pub fn is_blank(&self) -> bool {
        crate::sql::Tokenizer::new(&self.text).next().is_none()
    }

    /// The statement ends with `;` once trailing trivia is ignored.
    pub fn is_terminated(&self) -> bool {
        crate::sql::tokenize(&self.text)
            .last()
            .is_some_and(|t| t.kind == crate::sql::TokenKind::Semicolon)
    }
}
