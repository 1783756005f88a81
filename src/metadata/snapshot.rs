use crate::*;

/// Point-in-time copy of the catalog. Records are flat and ordered by
/// schema then name; children refer to their parents by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub schemas: Vec<Schema>,
    pub tables: Vec<Table>,
    pub columns: Vec<Column>,
    pub functions: Vec<Function>,
    pub types: Vec<PgType>,
    pub version: Option<Version>,
}

impl SchemaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.tables.is_empty() && self.functions.is_empty()
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.iter().any(|s| s.name == name)
    }

    pub fn tables_in<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a Table> {
        self.tables.iter().filter(move |t| t.schema == schema)
    }

    pub fn columns_of<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Column> {
        self.columns.iter().filter(move |c| c.belongs_to(schema, table))
    }

    /// Tables called `name` in any schema.
    pub fn find_table<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Table> + use<'a, 'n> {
        self.tables.iter().filter(move |t| t.name == name)
    }

    /// Table `schema.name`, or `name` in `default_schema` when unqualified,
    /// falling back to the only table of that name.
    pub fn resolve_table(
        &self,
        schema: Option<&str>,
        name: &str,
        default_schema: &str,
    ) -> Option<&Table> {
        if let Some(schema) = schema {
            return self.find_table(name).find(|t| t.schema == schema);
        }
        self.find_table(name)
            .find(|t| t.schema == default_schema)
            .or_else(|| {
                let mut matches = self.find_table(name);
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
    }

    /// Add (or create) the schema and insert the table with its columns in
    /// the given order.
    pub fn insert_table<N, T>(
        &mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = (N, T)>,
    ) -> &mut Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        let schema = schema.into();
        let table = table.into();
        self.insert_schema(schema.clone());
        for (name, data_type) in columns {
            self.columns
                .push(Column::new(schema.clone(), table.clone(), name, data_type));
        }
        self.tables.push(Table::new(schema, table));
        self
    }

    pub fn insert_schema(&mut self, schema: impl Into<String>) -> &mut Self {
        let schema = schema.into();
        if !self.has_schema(&schema) {
            self.schemas.push(Schema::new(schema));
        }
        self
    }

    pub fn insert_function(&mut self, function: Function) -> &mut Self {
        self.insert_schema(function.schema.clone());
        self.functions.push(function);
        self
    }
}
