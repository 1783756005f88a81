//! Where catalog snapshots come from.
use crate::*;
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<SchemaSnapshot>;
}

/// Reads the catalog of the database behind `pool`. System schemas are
/// left out, except that their types stay visible.
pub struct PgSchemaSource {
    pool: PgPool,
}

impl PgSchemaSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn schemas(&self) -> Result<Vec<Schema>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT nspname::text FROM pg_catalog.pg_namespace
             WHERE nspname !~ '^pg_' AND nspname <> 'information_schema'
             ORDER BY nspname",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| Schema::new(name)).collect())
    }

    async fn tables(&self) -> Result<Vec<Table>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT table_schema::text, table_name::text, table_type::text
             FROM information_schema.tables
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
             ORDER BY table_schema, table_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(schema, name, table_type)| Table {
                schema,
                name,
                kind: TableKind::from_table_type(&table_type),
            })
            .collect())
    }

    async fn columns(&self) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, String, String, bool, Option<String>)> = sqlx::query_as(
            "SELECT table_schema::text, table_name::text, column_name::text, data_type::text,
                    is_nullable::text = 'YES', column_default::text
             FROM information_schema.columns
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
             ORDER BY table_schema, table_name, ordinal_position",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(schema, table, name, data_type, nullable, default)| Column {
                schema,
                table,
                name,
                data_type,
                nullable,
                default,
            })
            .collect())
    }

    async fn functions(&self) -> Result<Vec<Function>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT n.nspname::text, p.proname::text,
                    pg_catalog.pg_get_function_arguments(p.oid),
                    pg_catalog.pg_get_function_result(p.oid)
             FROM pg_catalog.pg_proc p
             JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
             WHERE n.nspname !~ '^pg_' AND n.nspname <> 'information_schema'
             ORDER BY n.nspname, p.proname",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(schema, name, arguments, result)| Function {
                schema,
                name,
                arguments,
                result,
            })
            .collect())
    }

    async fn types(&self) -> Result<Vec<PgType>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT n.nspname::text, t.typname::text, t.typtype::text
             FROM pg_catalog.pg_type t
             JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
             WHERE t.typtype IN ('b', 'd', 'e', 'r', 'm')
               AND n.nspname <> 'information_schema'
               AND t.typname !~ '^_'
             ORDER BY n.nspname, t.typname",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(schema, name, kind)| PgType { schema, name, kind })
            .collect())
    }

    async fn version(&self) -> Result<Version> {
        let (version, number): (String, i32) = sqlx::query_as(
            "SELECT current_setting('server_version'), current_setting('server_version_num')::int4",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(Version { version, number })
    }
}

#[async_trait]
impl SchemaSource for PgSchemaSource {
    async fn fetch_catalog(&self) -> Result<SchemaSnapshot> {
        let started = std::time::Instant::now();
        let snapshot = SchemaSnapshot {
            schemas: self.schemas().await?,
            tables: self.tables().await?,
            columns: self.columns().await?,
            functions: self.functions().await?,
            types: self.types().await?,
            version: Some(self.version().await?),
        };
        debug!(
            schemas = snapshot.schemas.len(),
            tables = snapshot.tables.len(),
            columns = snapshot.columns.len(),
            "Fetched catalog in {:#.2?}",
            started.elapsed()
        );
        Ok(snapshot)
    }
}
