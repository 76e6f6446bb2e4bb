//! Centralized configuration for the papershelf cache.
//!
//! Constants for the on-disk store: well-known file and directory names,
//! the supported schema version, and SQLite tuning knobs.

/// On-disk store configuration.
pub struct StoreConfig;

impl StoreConfig {
    /// Database file name used by [`crate::paths::default_db_path`].
    pub const DB_FILENAME: &'static str = "pdf-cache.db";
    /// Per-user data directory name holding the database file.
    pub const DATA_DIR_NAME: &'static str = "papershelf";

    // Schema
    pub const SCHEMA_VERSION: i64 = 1;

    // SQLite tuning
    pub const BUSY_TIMEOUT_MS: u32 = 5_000;
}
