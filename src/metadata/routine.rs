#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub schema: String,
    pub name: String,
    /// Argument list as printed by `pg_get_function_arguments`.
    pub arguments: String,
    /// `None` for procedures.
    pub result: Option<String>,
}

impl Function {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            arguments: String::new(),
            result: None,
        }
    }

    pub fn signature(&self) -> String {
        match &self.result {
            Some(result) => format!("{}({}) -> {result}", self.name, self.arguments),
            None => format!("{}({})", self.name, self.arguments),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgType {
    pub schema: String,
    pub name: String,
    /// `pg_type.typtype`: `b` base, `d` domain, `e` enum, `r` range, `m` multirange.
    pub kind: String,
}
