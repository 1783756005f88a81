#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Type as reported by `information_schema.columns.data_type`.
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl Column {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn belongs_to(&self, schema: &str, table: &str) -> bool {
        self.schema == schema && self.table == table
    }
}
