use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ItemKind {
    #[display("column")]
    Column,
    #[display("table")]
    Table,
    #[display("function")]
    Function,
    #[display("schema")]
    Schema,
}

/// A catalog object that may be offered at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub kind: ItemKind,
    pub name: &'a str,
    /// Owning schema. `None` for schemas themselves.
    pub schema: Option<&'a str>,
    /// Owning table of a column.
    pub table: Option<&'a str>,
    pub detail: Option<String>,
}

impl<'a> Candidate<'a> {
    /// Every schema, table, column and function in the snapshot.
    pub fn all(snapshot: &'a SchemaSnapshot) -> Vec<Self> {
        let schemas = snapshot.schemas.iter().map(|schema| Self {
            kind: ItemKind::Schema,
            name: &schema.name,
            schema: None,
            table: None,
            detail: None,
        });
        let tables = snapshot.tables.iter().map(|table| Self {
            kind: ItemKind::Table,
            name: &table.name,
            schema: Some(table.schema.as_str()),
            table: None,
            detail: Some(table.kind.to_string()),
        });
        let columns = snapshot.columns.iter().map(|column| Self {
            kind: ItemKind::Column,
            name: &column.name,
            schema: Some(column.schema.as_str()),
            table: Some(column.table.as_str()),
            detail: Some(format!("{}.{} {}", column.table, column.name, column.data_type)),
        });
        let functions = snapshot.functions.iter().map(|function| Self {
            kind: ItemKind::Function,
            name: &function.name,
            schema: Some(function.schema.as_str()),
            table: None,
            detail: Some(function.signature()),
        });
        schemas.chain(tables).chain(columns).chain(functions).collect()
    }
}

/// A completion item with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{label} ({kind}, {score})")]
pub struct ScoredItem {
    pub label: String,
    pub kind: ItemKind,
    pub schema: Option<String>,
    pub detail: Option<String>,
    pub score: i32,
}

impl ScoredItem {
    pub fn new(candidate: Candidate, score: i32) -> Self {
        Self {
            label: candidate.name.to_string(),
            kind: candidate.kind,
            schema: candidate.schema.map(str::to_string),
            detail: candidate.detail,
            score,
        }
    }
}
