/// Database layer for Octavia
///
/// Manages the SQLite connection pool, embedded migrations, and typed access
/// to the stage cache, author, bonus and probe metric tables.

pub mod author;
pub mod bonus;
pub mod probe;
pub mod stage;

pub use author::{AuthorRecord, AuthorStore};
pub use bonus::BonusStore;
pub use probe::{aggregate_buckets, ProbeDatapoint, ProbeStore, StatusDataPoint};
pub use stage::StageStore;

use crate::error::{OctaviaError, OctaviaResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Database path that selects a throwaway in-memory database
pub const MEMORY_DATABASE: &str = ":memory:";

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Open the configured database and bring its schema up to date
pub async fn open(path: &Path, options: DatabaseOptions) -> OctaviaResult<SqlitePool> {
    let pool = if path.as_os_str() == MEMORY_DATABASE {
        memory_pool().await?
    } else {
        create_pool(path, options).await?
    };
    run_migrations(&pool).await?;
    test_connection(&pool).await?;
    Ok(pool)
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> OctaviaResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    SqliteJournalMode::Wal
                } else {
                    SqliteJournalMode::Delete
                })
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Create a single-connection in-memory pool
///
/// The connection never idles out, otherwise the database would vanish with it.
pub async fn memory_pool() -> OctaviaResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> OctaviaResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| OctaviaError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> OctaviaResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// In-memory pool with the schema applied
pub async fn open_memory() -> OctaviaResult<SqlitePool> {
    open(Path::new(MEMORY_DATABASE), DatabaseOptions::default()).await
}
