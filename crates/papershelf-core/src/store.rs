//! Lazily-opened handle to the SQLite store backing the cache.

use crate::config::StoreConfig;
use crate::error::{PapershelfError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Owned handle to the cache database.
///
/// The connection is opened lazily on first use and memoized only after a
/// successful open; a failed open leaves the handle empty so a later
/// operation retries from scratch. Uses WAL mode, with an async mutex
/// serializing all access to the single connection.
pub struct StorageHandle {
    db_path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl StorageHandle {
    /// Create a handle for the database at `db_path`. Performs no I/O; the
    /// database is opened (and the schema created) on first use.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            conn: Mutex::new(None),
        }
    }

    /// The configured database location.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open the database if no connection is cached yet. Idempotent: a
    /// memoized connection is reused as-is, and a failure is surfaced
    /// without being cached.
    pub async fn ensure_open(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(())).await
    }

    /// Whether a connection is currently memoized. Does not trigger an open.
    pub async fn is_open(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Run `op` against the live connection, opening the database first if
    /// needed. Callers are serialized on the handle's mutex.
    pub(crate) async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut slot = self.conn.lock().await;
        if slot.is_none() {
            *slot = Some(self.open_and_migrate()?);
        }
        let conn = slot.as_ref().ok_or_else(|| PapershelfError::Open {
            message: "Connection missing after open".to_string(),
            source: None,
        })?;
        op(conn)
    }

    /// Open the database file, apply connection pragmas, and bring the
    /// schema up to [`StoreConfig::SCHEMA_VERSION`].
    fn open_and_migrate(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| PapershelfError::Open {
                    message: format!(
                        "Failed to create data directory {}: {}",
                        parent.display(),
                        e
                    ),
                    source: None,
                })?;
            }
        }

        let conn = Connection::open(&self.db_path).map_err(|e| PapershelfError::Open {
            message: format!("Failed to open database at {}", self.db_path.display()),
            source: Some(e),
        })?;

        Self::configure_connection(&conn).map_err(|e| PapershelfError::Open {
            message: "Failed to configure database connection".to_string(),
            source: Some(e),
        })?;

        let version = Self::schema_version(&conn).map_err(|e| PapershelfError::Open {
            message: "Failed to read schema version".to_string(),
            source: Some(e),
        })?;

        if version > StoreConfig::SCHEMA_VERSION {
            return Err(PapershelfError::Open {
                message: format!(
                    "Database schema version {} is newer than supported version {}",
                    version,
                    StoreConfig::SCHEMA_VERSION
                ),
                source: None,
            });
        }

        if version < StoreConfig::SCHEMA_VERSION {
            Self::ensure_schema(&conn).map_err(|e| PapershelfError::Open {
                message: "Failed to create record store schema".to_string(),
                source: Some(e),
            })?;
            debug!(
                "Created record store schema v{} at {}",
                StoreConfig::SCHEMA_VERSION,
                self.db_path.display()
            );
        }

        debug!("Opened PDF store at {}", self.db_path.display());
        Ok(conn)
    }

    fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;",
            StoreConfig::BUSY_TIMEOUT_MS,
        ))
    }

    fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
    }

    /// Create the record store and its indexes, then stamp the schema
    /// version. The DDL is `IF NOT EXISTS` throughout, so running it
    /// against an already-migrated database changes nothing.
    fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS pdfs (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                blob BLOB NOT NULL,
                download_date TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{{}}'
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_pdfs_url ON pdfs(url);
            CREATE INDEX IF NOT EXISTS idx_pdfs_download_date ON pdfs(download_date);

            PRAGMA user_version = {};",
            StoreConfig::SCHEMA_VERSION,
        ))
    }
}
