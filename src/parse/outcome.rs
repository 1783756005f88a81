use crate::*;
use std::sync::Arc;

/// Result of running both parsers over one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The strict parse failed and the text is not recognizable as a
    /// statement, so there is no useful tolerant tree either.
    SyntaxErrorOnly(SyntaxError),
    /// The strict parse failed; completion still has the tolerant tree.
    TolerantOnly {
        tolerant: Arc<TolerantTree>,
        error: SyntaxError,
    },
    Both {
        strict: Arc<StrictTree>,
        tolerant: Arc<TolerantTree>,
    },
}

impl ParseOutcome {
    pub fn reconcile(
        strict: std::result::Result<StrictTree, SyntaxError>,
        tolerant: TolerantTree,
    ) -> Self {
        match strict {
            Ok(strict) => Self::Both {
                strict: Arc::new(strict),
                tolerant: Arc::new(tolerant),
            },
            Err(error) if tolerant.kind() == StatementKind::Unknown => Self::SyntaxErrorOnly(error),
            Err(error) => Self::TolerantOnly {
                tolerant: Arc::new(tolerant),
                error,
            },
        }
    }

    pub fn strict(&self) -> Option<&StrictTree> {
        match self {
            Self::Both { strict, .. } => Some(strict.as_ref()),
            _ => None,
        }
    }

    pub fn tolerant(&self) -> Option<&Arc<TolerantTree>> {
        match self {
            Self::TolerantOnly { tolerant, .. } | Self::Both { tolerant, .. } => Some(tolerant),
            Self::SyntaxErrorOnly(_) => None,
        }
    }

    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::SyntaxErrorOnly(error) | Self::TolerantOnly { error, .. } => Some(error),
            Self::Both { .. } => None,
        }
    }
}
