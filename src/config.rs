use crate::*;
use confique::Config as _;
use std::sync::OnceLock;

#[derive(Debug, Clone, confique::Config)]
pub struct Config {
    /// Connection string of the database used for type checks and the schema
    /// cache. Unset means schema-dependent features stay disabled.
    #[config(env = "PGLENS_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Schema that unqualified names resolve against.
    #[config(env = "PGLENS_DEFAULT_SCHEMA", default = "public")]
    pub default_schema: String,

    #[config(env = "PGLENS_MAX_COMPLETIONS", default = 50)]
    pub max_completions: usize,

    /// Candidates scoring below this are dropped.
    #[config(env = "PGLENS_MIN_COMPLETION_SCORE", default = 5)]
    pub min_completion_score: i32,

    /// Lint rule ids to skip, comma separated.
    #[config(
        env = "PGLENS_DISABLED_LINT_RULES",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub disabled_lint_rules: Vec<String>,

    /// Upper bound of cached entries per document and cache kind.
    #[config(env = "PGLENS_CACHE_CAPACITY", default = 10_000)]
    pub cache_capacity: u64,

    #[config(env = "PGLENS_MAX_CONNECTIONS", default = 3)]
    pub max_connections: u32,

    #[cfg(test)]
    #[config(env = "PGLENS_CONTAINER_RAMDISKED", default = true)]
    pub container_ramdisked: bool,
    #[cfg(test)]
    #[config(env = "PGLENS_CONTAINER_LOGS", default = false)]
    pub container_logs: bool,
}

impl Config {
    /// Load the configuration from the current environment.
    pub fn load() -> Result<Self> {
        Ok(Self::builder().env().load()?)
    }
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::load()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
