#![cfg(test)]
crate::reexport!(container);
crate::reexport!(context);
crate::reexport!(fakes);
pub use rstest::*;

pub(in crate::testing) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

mod isolated_integration_tests {
    use super::{super::*, *};

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn starts_on_an_empty_database(ctx: &mut IsolatedIntegrationTest) -> Result {
        let database: String = sqlx::query_scalar("SELECT current_database();")
            .fetch_one(&ctx.pool)
            .await?;
        assert_eq!(ctx.database, database);

        let tables: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_one(&ctx.pool)
        .await?;
        assert_eq!(tables, 0);
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[rstest]
    #[case("first")]
    #[case("second")]
    #[tokio::test]
    async fn same_schema_in_every_test(ctx: &mut IsolatedIntegrationTest, #[case] name: &str) -> Result {
        // Both cases create the same table; each runs on its own database.
        sqlx::query("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)")
            .execute(&ctx.pool)
            .await?;
        sqlx::query("INSERT INTO users (id, name) VALUES (1, $1)")
            .bind(name)
            .execute(&ctx.pool)
            .await?;

        let snapshot = PgSchemaSource::new(ctx.pool.clone()).fetch_catalog().await?;
        assert_eq!(snapshot.tables.len(), 1);
        assert_eq!(snapshot.columns_of("public", "users").count(), 2);
        Ok(())
    }
}
