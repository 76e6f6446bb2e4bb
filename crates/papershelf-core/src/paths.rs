//! Default on-disk locations for the cache database.
//!
//! Embedders may point [`crate::PdfCache`] at any path; these helpers give
//! the well-known per-user location so callers that do not care get a
//! sensible one.

use crate::config::StoreConfig;
use crate::error::{PapershelfError, Result};
use std::path::PathBuf;

/// Get the papershelf data directory.
///
/// # Platform Behavior
/// - **Linux**: `~/.local/share/papershelf` (XDG data home)
/// - **Windows**: `%LOCALAPPDATA%\papershelf`
/// - **macOS**: `~/Library/Application Support/papershelf`
pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| PapershelfError::Open {
        message: "Could not determine platform data directory".to_string(),
        source: None,
    })?;
    Ok(data_dir.join(StoreConfig::DATA_DIR_NAME))
}

/// Get the default path of the cache database.
///
/// Returns `{data_dir}/pdf-cache.db`.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(StoreConfig::DB_FILENAME))
}
