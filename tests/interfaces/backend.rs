//! Backend factory for interface tests.
//!
//! Provides a unified interface to create storage backends based on environment configuration.

use std::env;
use std::sync::Arc;

use roi_engine::storage::Stores;

#[cfg(feature = "postgres")]
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    GenericImage, ImageExt,
};

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite,
    Postgres,
}

impl StorageBackend {
    pub fn from_env() -> Self {
        match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Sqlite,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Postgres => "postgres",
        }
    }
}

/// Container handles to keep containers alive during tests.
#[allow(dead_code)]
#[derive(Debug)]
pub enum ContainerHandle {
    None,
    #[cfg(feature = "postgres")]
    Postgres(testcontainers::ContainerAsync<GenericImage>),
}

/// Holds the stores for a backend.
pub struct StorageContext {
    pub stores: Stores,
    /// Container handle to keep container alive.
    #[allow(dead_code)]
    container: ContainerHandle,
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("directory", &"<dyn DirectoryStore>")
            .field("ledger", &"<dyn LedgerStore>")
            .field("runs", &"<dyn RunLogStore>")
            .field("container", &self.container)
            .finish()
    }
}

impl StorageContext {
    /// Create a storage context for the configured backend.
    pub async fn new(backend: StorageBackend) -> Self {
        match backend {
            StorageBackend::Memory => StorageContext {
                stores: Stores::in_memory(),
                container: ContainerHandle::None,
            },
            StorageBackend::Sqlite => Self::create_sqlite().await,
            StorageBackend::Postgres => Self::create_postgres().await,
        }
    }

    #[cfg(feature = "sqlite")]
    async fn create_sqlite() -> Self {
        use roi_engine::storage::{SqliteDirectoryStore, SqliteLedgerStore, SqliteRunLogStore};

        let pool = roi_engine::storage::sql::sqlite::connect_sqlite(":memory:", 1)
            .await
            .expect("Failed to create SQLite pool");

        // Run migrations
        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        StorageContext {
            stores: Stores {
                directory: Arc::new(SqliteDirectoryStore::new(pool.clone())),
                ledger: Arc::new(SqliteLedgerStore::new(pool.clone())),
                runs: Arc::new(SqliteRunLogStore::new(pool)),
            },
            container: ContainerHandle::None,
        }
    }

    #[cfg(not(feature = "sqlite"))]
    async fn create_sqlite() -> Self {
        panic!("SQLite feature not enabled. Build with --features sqlite");
    }

    #[cfg(feature = "postgres")]
    async fn create_postgres() -> Self {
        use std::time::Duration;

        use roi_engine::storage::{
            PostgresDirectoryStore, PostgresLedgerStore, PostgresRunLogStore,
        };

        let image = GenericImage::new("postgres", "16")
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stdout(
                "database system is ready to accept connections",
            ));

        let container = image
            .with_env_var("POSTGRES_USER", "roi")
            .with_env_var("POSTGRES_PASSWORD", "roi")
            .with_env_var("POSTGRES_DB", "roi")
            .with_startup_timeout(Duration::from_secs(60))
            .start()
            .await
            .expect("Failed to start postgres container");

        tokio::time::sleep(Duration::from_secs(1)).await;

        let host_port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get mapped port");
        let host = container
            .get_host()
            .await
            .expect("Failed to get container host");

        let uri = format!("postgres://roi:roi@{}:{}/roi", host, host_port);
        let pool = roi_engine::storage::sql::postgres::connect_postgres(&uri, 5)
            .await
            .expect("Failed to connect to PostgreSQL");

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        StorageContext {
            stores: Stores {
                directory: Arc::new(PostgresDirectoryStore::new(pool.clone())),
                ledger: Arc::new(PostgresLedgerStore::new(pool.clone())),
                runs: Arc::new(PostgresRunLogStore::new(pool)),
            },
            container: ContainerHandle::Postgres(container),
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn create_postgres() -> Self {
        panic!("PostgreSQL feature not enabled. Build with --features postgres");
    }
}
