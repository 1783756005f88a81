//! The database as the judge of whether a statement type checks.
crate::reexport!(validator);

use crate::*;
use async_trait::async_trait;

/// An error the database reported for a statement.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{message} ({code})")]
pub struct TypeError {
    /// SQLSTATE, e.g. `42703` for an undefined column.
    pub code: String,
    pub message: String,
    /// Byte offset into the statement text.
    pub position: Option<usize>,
}

impl TypeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            position,
        }
    }
}

/// Checks statements against a live database without executing them.
///
/// `Ok(errors)` is the verdict on the statement. `Err` means the check
/// itself could not run (connection lost, pool exhausted, ...).
#[async_trait]
pub trait DatabaseAuthority: Send + Sync {
    async fn validate(&self, sql: &str) -> Result<Vec<TypeError>>;
}
