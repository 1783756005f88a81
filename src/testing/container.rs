use crate::*;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::{Duration, Instant};
use testcontainers::{
    ContainerRequest, GenericImage, ImageExt,
    core::{IntoContainerPort as _, WaitFor, logs::LogFrame},
    runners::AsyncRunner as _,
};
use tokio::sync::OnceCell;

pub type Container = testcontainers::ContainerAsync<GenericImage>;

const PG_USER: &str = "postgres";
const PG_PASS: &str = "postgres";
const PG_PORT: u16 = 5432;

/// Postgres container shared by every integration test of the run.
pub async fn postgres() -> &'static Container {
    static POSTGRES: OnceCell<Container> = OnceCell::const_new();
    const TRIES: u8 = 3;
    POSTGRES
        .get_or_init(|| async {
            let mut attempt = 1;
            loop {
                match start().await {
                    Ok(container) => break container,
                    Err(error) if attempt < TRIES => {
                        warn!("Container start {attempt}/{TRIES} failed: {error}");
                        attempt += 1;
                    }
                    Err(error) => {
                        error!("Giving up on the test container: {error}");
                        std::process::exit(1);
                    }
                }
            }
        })
        .await
}

/// Pool to `database` inside the shared container.
pub(super) async fn pool(database: &str) -> PgPool {
    let container = postgres().await;
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(PG_PORT)
        .await
        .expect("container port");
    PgPoolOptions::new()
        .max_connections(config().max_connections)
        .connect(&format!("postgres://{PG_USER}:{PG_PASS}@{host}:{port}/{database}"))
        .await
        .expect("test database connection")
}

async fn start() -> Result<Container> {
    debug!("Starting Postgres container");
    let started = Instant::now();
    let container = image()
        .start()
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;
    debug!("Postgres container ready in {:#.2?}", started.elapsed());
    Ok(container)
}

fn image() -> ContainerRequest<GenericImage> {
    // Durability is irrelevant for throwaway databases.
    const PG_INIT_SQL: &[u8] = b"
        ALTER SYSTEM SET fsync = off;
        ALTER SYSTEM SET synchronous_commit = off;
        ALTER SYSTEM SET full_page_writes = off;
        ALTER SYSTEM SET max_connections = 200;";

    const fn gib(n: u64) -> u64 {
        n * 1024 * 1024 * 1024
    }

    let mut image = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(PG_PORT.tcp())
        .with_wait_for(WaitFor::message_on_stderr("listening on IPv4 address"))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_copy_to("/docker-entrypoint-initdb.d/init.sql", PG_INIT_SQL.to_vec())
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASS)
        .with_env_var("POSTGRES_DB", "postgres");

    if config().container_logs {
        image = image.with_log_consumer(|line: &LogFrame| trace!("[postgres] {line:?}"));
    }

    if config().container_ramdisked {
        image = image
            .with_env_var("PGDATA", "/dev/shm/pgdata")
            .with_shm_size(gib(1));
    }

    image.with_startup_timeout(Duration::from_secs(60))
}
