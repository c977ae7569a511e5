//! Postgres-backed test context on a shared testcontainer.
//!
//! The first test to ask for a `TestHarness` starts Postgres 16 and applies
//! `migrations/`; every later test reuses that database.

use anyhow::{Context, Result};
use server_core::kernel::{PostgresJournal, PostgresStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

struct SharedDatabase {
    url: String,
    _container: ContainerAsync<Postgres>,
}

static DATABASE: OnceCell<SharedDatabase> = OnceCell::const_new();

async fn start_database() -> Result<SharedDatabase> {
    // RUST_LOG=debug cargo test -- --ignored --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .context("Failed to start Postgres container")?;

    let url = format!(
        "postgresql://postgres:postgres@{}:{}/postgres",
        container.get_host().await?,
        container.get_host_port_ipv4(5432).await?
    );

    let pool = PgPool::connect(&url)
        .await
        .context("Failed to connect for migrations")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(SharedDatabase {
        url,
        _container: container,
    })
}

/// Fresh pool per test. Tests share one database, so rows must be keyed by
/// [`TestHarness::unique_domain`] to stay isolated.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// #[ignore = "requires docker"]
/// async fn stores_jobs(ctx: &TestHarness) {
///     ctx.store().persist_jobs(&jobs).await.unwrap();
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let database = DATABASE
            .get_or_try_init(start_database)
            .await
            .context("Failed to initialize shared Postgres")?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database.url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self { db_pool })
    }

    pub fn store(&self) -> PostgresStore {
        PostgresStore::new(self.db_pool.clone())
    }

    pub fn journal(&self) -> PostgresJournal {
        PostgresJournal::new(self.db_pool.clone())
    }

    /// A domain no other test uses.
    pub fn unique_domain(&self) -> String {
        format!("{}.example.com", Uuid::new_v4().simple())
    }
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }
}
