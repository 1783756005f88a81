#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum TableKind {
    #[default]
    #[display("table")]
    Table,
    #[display("view")]
    View,
    #[display("foreign table")]
    Foreign,
}

impl TableKind {
    /// Maps `information_schema.tables.table_type`.
    pub fn from_table_type(table_type: &str) -> Self {
        match table_type {
            "VIEW" => Self::View,
            "FOREIGN" => Self::Foreign,
            _ => Self::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: TableKind::Table,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}
