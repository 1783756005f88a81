//! Type checking through `PREPARE`.
use crate::*;
use async_trait::async_trait;
use sqlx::{
    AssertSqlSafe, Executor as _, PgPool, SqlSafeStr as _,
    postgres::{PgDatabaseError, PgErrorPosition, PgStatement},
};

/// [`DatabaseAuthority`] that asks PostgreSQL to prepare each statement.
/// Preparing parses and analyzes, so unknown relations or columns and type
/// mismatches are reported, but nothing is executed.
#[derive(Debug, Clone)]
pub struct PgAuthority {
    pool: PgPool,
}

impl PgAuthority {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn prepare(&self, sql: &str) -> Result<PgStatement> {
        let sql = AssertSqlSafe(sql.to_owned()).into_sql_str();
        self.pool.prepare(sql).await.map_err(Into::into)
    }
}

/// Byte offset of the 1-based character position PostgreSQL reports.
fn byte_offset(sql: &str, position: usize) -> Option<usize> {
    let index = position.checked_sub(1)?;
    sql.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(sql.len()))
        .nth(index)
}

#[async_trait]
impl DatabaseAuthority for PgAuthority {
    async fn validate(&self, sql: &str) -> Result<Vec<TypeError>> {
        match self.prepare(sql).await {
            Ok(_) => Ok(Vec::new()),
            Err(Error::Database(sqlx::Error::Database(error))) => {
                let type_error = match error.try_downcast_ref::<PgDatabaseError>() {
                    Some(pg) => {
                        let position = match pg.position() {
                            Some(PgErrorPosition::Original(position)) => byte_offset(sql, position),
                            _ => None,
                        };
                        TypeError::new(pg.code(), pg.message(), position)
                    }
                    None => TypeError::new(
                        error.code().unwrap_or_default(),
                        error.message(),
                        None,
                    ),
                };
                Ok(vec![type_error])
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Column as _, Statement as _};

    #[test_context(IsolatedIntegrationTest)]
    #[rstest]
    #[case("SELECT 1", &["?column?"])]
    #[case("SELECT 1 as one;", &["one"])]
    #[case("SELECT table_name FROM information_schema.tables", &["table_name"])]
    #[tokio::test]
    async fn valid_statements_prepare_cleanly(
        ctx: &mut IsolatedIntegrationTest,
        #[case] sql: &'static str,
        #[case] columns: &[&'static str],
    ) {
        let authority = PgAuthority::new(ctx.pool.clone());
        let statement = authority.prepare(sql).await.expect("statement prepares");
        let actual_columns = statement
            .columns()
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>();
        assert_eq!(actual_columns, columns);

        let errors = authority.validate(sql).await.expect("validation runs");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test_context(IsolatedIntegrationTest)]
    #[rstest]
    #[case("SELECT 1!", "42601", "syntax error at end of input", Some(9))]
    #[case("!SELECT 1", "42601", r#"syntax error at or near "!""#, Some(0))]
    #[case("SELECT * TABLE;", "42601", r#"syntax error at or near "TABLE""#, Some(9))]
    #[case(
        "SELECT col1, col2 TABLE;",
        "42703",
        r#"column "col1" does not exist"#,
        Some(7)
    )]
    #[case("SELECT col1 FROM pg_class", "42703", r#"column "col1" does not exist"#, Some(7))]
    #[case("SELECT 'é', nope", "42703", r#"column "nope" does not exist"#, Some(13))]
    #[tokio::test]
    async fn invalid_statements_report_one_error(
        ctx: &mut IsolatedIntegrationTest,
        #[case] sql: &'static str,
        #[case] code: &'static str,
        #[case] message: &'static str,
        #[case] position: Option<usize>,
    ) {
        let authority = PgAuthority::new(ctx.pool.clone());
        let errors = authority.validate(sql).await.expect("validation runs");
        assert_eq!(errors, vec![TypeError::new(code, message, position)]);
    }

    #[rstest]
    #[case("abc", 1, Some(0))]
    #[case("abc", 4, Some(3))]
    #[case("é b", 3, Some(3))]
    #[case("abc", 0, None)]
    #[case("abc", 9, None)]
    fn positions_are_converted_to_bytes(
        #[case] sql: &str,
        #[case] position: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(byte_offset(sql, position), expected);
    }
}
