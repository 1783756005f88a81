#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Server version as reported by `server_version` / `server_version_num`.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{version}")]
pub struct Version {
    pub version: String,
    pub number: i32,
}

impl Version {
    pub fn major(&self) -> i32 {
        self.number / 10_000
    }
}
