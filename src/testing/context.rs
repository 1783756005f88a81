use crate::{debug, testing::*};
use sqlx::{PgPool, Postgres};
use test_context::AsyncTestContext;
pub use test_context::test_context;

/// A database of its own inside the shared container, dropped on teardown.
pub struct IsolatedIntegrationTest {
    pub pool: PgPool,
    pub database: String,
    /// Keep the database after the test for inspection when false.
    pub drop_on_teardown: bool,
}

impl IsolatedIntegrationTest {
    async fn create_database<'c, E: sqlx::Executor<'c, Database = Postgres>>(exec: E) -> String {
        use rand::Rng;
        let suffix: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        let database = format!("pglens_{}", suffix.to_lowercase());

        sqlx::query(sqlx::AssertSqlSafe(format!("CREATE DATABASE {database}")))
            .execute(exec)
            .await
            .expect("test database creation");
        database
    }
}

impl AsyncTestContext for IsolatedIntegrationTest {
    async fn setup() -> Self {
        crate::testing::common_init();
        let admin = pool("postgres").await;
        let database = Self::create_database(&admin).await;
        admin.close().await;

        Self {
            pool: pool(&database).await,
            database,
            drop_on_teardown: true,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;
        if !self.drop_on_teardown {
            debug!("Keeping test database {}", self.database);
            return;
        }

        let admin = pool("postgres").await;
        sqlx::query(sqlx::AssertSqlSafe(format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            self.database
        )))
        .execute(&admin)
        .await
        .expect("test database removal");
    }
}
