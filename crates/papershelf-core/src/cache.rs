//! URL-keyed blob cache for downloaded PDFs.
//!
//! Reads degrade to "not cached" when storage misbehaves so the viewer can
//! always fall back to a network fetch; writes reject invalid input loudly
//! and report storage faults as a `false` return. The mapping between those
//! two postures lives in one place, [`fail_soft`].

use crate::error::{PapershelfError, Result};
use crate::records::{CacheRecord, PdfSummary};
use crate::store::StorageHandle;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

/// URL-keyed cache of downloaded PDFs over a single SQLite database.
///
/// The key is normally the PDF's remote URL, but any unique non-empty
/// string works — callers that track PDFs by an opaque identifier use that
/// identifier as the key directly.
///
/// Records are immutable once written: a `put` for an already-cached key
/// returns `false` and leaves the stored record untouched. Replacing a
/// record is an explicit `delete` followed by a `put`.
pub struct PdfCache {
    handle: StorageHandle,
}

impl PdfCache {
    /// Create a cache over the database at `db_path`. The database is
    /// opened lazily on the first operation.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            handle: StorageHandle::new(db_path),
        }
    }

    /// Create a cache over an existing [`StorageHandle`].
    pub fn with_handle(handle: StorageHandle) -> Self {
        Self { handle }
    }

    /// The underlying storage handle.
    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }

    /// Check whether a record is cached for `url`.
    ///
    /// Returns `false` both when no record is found and when the lookup
    /// fails — a storage glitch reads as "not cached" so the caller falls
    /// back to a network fetch instead of stalling.
    pub async fn exists(&self, url: &str) -> Result<bool> {
        let key = url.to_string();
        let result = self
            .handle
            .with_conn(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT 1 FROM pdfs WHERE url = ?1 LIMIT 1",
                        params![key],
                        |_row| Ok(()),
                    )
                    .optional()?;
                Ok(row.is_some())
            })
            .await;
        fail_soft("exists", false, result)
    }

    /// Fetch the cached payload for `url`.
    ///
    /// Returns `None` on a miss or on any internal storage failure, per the
    /// same fail-safe policy as [`PdfCache::exists`].
    pub async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let key = url.to_string();
        let result = self
            .handle
            .with_conn(move |conn| {
                let blob = conn
                    .query_row(
                        "SELECT blob FROM pdfs WHERE url = ?1",
                        params![key],
                        |row| row.get::<_, Vec<u8>>(0),
                    )
                    .optional()?;
                Ok(blob)
            })
            .await;
        fail_soft("get", None, result)
    }

    /// Fetch the whole stored record for `url`, including caller metadata.
    ///
    /// Same miss and fail-safe behavior as [`PdfCache::get`]. A metadata
    /// column that no longer parses degrades to an empty map rather than
    /// failing the read.
    pub async fn get_entry(&self, url: &str) -> Result<Option<CacheRecord>> {
        let key = url.to_string();
        let result = self
            .handle
            .with_conn(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT id, url, blob, download_date, file_size, metadata
                         FROM pdfs WHERE url = ?1",
                        params![key],
                        row_to_record,
                    )
                    .optional()?;
                Ok(record)
            })
            .await;
        fail_soft("get_entry", None, result)
    }

    /// Cache `blob` under `url`. See [`PdfCache::put_with_metadata`].
    pub async fn put(&self, url: &str, blob: &[u8]) -> Result<bool> {
        self.put_with_metadata(url, blob, Map::new()).await
    }

    /// Cache `blob` under `url` with caller-supplied extra fields.
    ///
    /// Fails with the precondition kind if `url` is empty or `blob` is
    /// empty — those are caller contract violations and are never
    /// swallowed. Returns `true` on success and `false` on an internal
    /// storage failure, including the case where `url` is already cached
    /// (the first writer wins; see the type-level docs).
    pub async fn put_with_metadata(
        &self,
        url: &str,
        blob: &[u8],
        metadata: Map<String, Value>,
    ) -> Result<bool> {
        validate_url(url)?;
        validate_blob(blob)?;

        let record = CacheRecord::new(url, blob.to_vec(), metadata);
        let result = self
            .handle
            .with_conn(move |conn| insert_record(conn, &record))
            .await;
        fail_soft("put", false, result.map(|()| true))
    }

    /// Remove the record stored for `url`.
    ///
    /// Returns `true` if a record was found and removed, `false` if none
    /// existed or on internal failure.
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let key = url.to_string();
        let result = self
            .handle
            .with_conn(move |conn| {
                let removed = conn.execute("DELETE FROM pdfs WHERE url = ?1", params![key])?;
                if removed > 0 {
                    debug!("Deleted cached record for {}", key);
                }
                Ok(removed > 0)
            })
            .await;
        fail_soft("delete", false, result)
    }

    /// List every stored record's summary, without payloads.
    ///
    /// Entries come back in storage-native order; callers must not depend
    /// on it. Degrades to an empty list on internal failure.
    pub async fn list(&self) -> Result<Vec<PdfSummary>> {
        let result = self
            .handle
            .with_conn(|conn| {
                let mut stmt = conn.prepare("SELECT url, download_date, file_size FROM pdfs")?;
                let rows = stmt.query_map([], |row| {
                    Ok(PdfSummary {
                        url: row.get(0)?,
                        download_date: row.get(1)?,
                        file_size: row.get::<_, i64>(2)? as u64,
                    })
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await;
        fail_soft("list", Vec::new(), result)
    }

    /// Remove all records. Returns `true` on success, `false` on internal
    /// failure. Idempotent.
    pub async fn clear(&self) -> Result<bool> {
        let result = self
            .handle
            .with_conn(|conn| {
                let removed = conn.execute("DELETE FROM pdfs", [])?;
                debug!("Cleared {} cached records", removed);
                Ok(true)
            })
            .await;
        fail_soft("clear", false, result)
    }
}

/// Map storage faults to the operation's documented default value.
///
/// Open failures and precondition violations pass through untouched; only
/// the storage-fault classification is absorbed. Every cache operation
/// funnels its result through here, so the fail-safe policy has exactly one
/// implementation.
fn fail_soft<T>(operation: &str, fallback: T, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_storage_fault() => {
            if matches!(err, PapershelfError::Duplicate { .. }) {
                debug!("{} left the existing record in place: {}", operation, err);
            } else {
                warn!("{} degraded to its default after a storage fault: {}", operation, err);
            }
            Ok(fallback)
        }
        Err(err) => Err(err),
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(PapershelfError::Precondition {
            field: "url".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_blob(blob: &[u8]) -> Result<()> {
    if blob.is_empty() {
        return Err(PapershelfError::Precondition {
            field: "blob".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn insert_record(conn: &Connection, record: &CacheRecord) -> Result<()> {
    let metadata_json =
        serde_json::to_string(&record.metadata).map_err(|e| PapershelfError::Precondition {
            field: "metadata".to_string(),
            message: format!("not serializable as JSON: {}", e),
        })?;

    let inserted = conn.execute(
        "INSERT INTO pdfs (id, url, blob, download_date, file_size, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id,
            record.url,
            record.blob,
            record.download_date,
            record.file_size as i64,
            metadata_json
        ],
    );

    match inserted {
        Ok(_) => {
            debug!("Cached {} bytes for {}", record.file_size, record.url);
            Ok(())
        }
        Err(err) if is_unique_violation(&err) => Err(PapershelfError::Duplicate {
            url: record.url.clone(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheRecord> {
    let metadata_json: String = row.get(5)?;
    let metadata = serde_json::from_str(&metadata_json).unwrap_or_else(|e| {
        warn!("Ignoring unreadable metadata on cached record: {}", e);
        Map::new()
    });

    Ok(CacheRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        blob: row.get(2)?,
        download_date: row.get(3)?,
        file_size: row.get::<_, i64>(4)? as u64,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &[u8] = b"%PDF-1.4 sample payload";

    fn create_test_cache() -> (TempDir, PdfCache) {
        let dir = TempDir::new().unwrap();
        let cache = PdfCache::new(dir.path().join("pdf-cache.db"));
        (dir, cache)
    }

    /// Second connection to the same database, for poking at it behind the
    /// cache's back.
    fn raw_conn(cache: &PdfCache) -> Connection {
        Connection::open(cache.handle().db_path()).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_bytes() {
        let (_dir, cache) = create_test_cache();
        assert!(cache.put("https://x/a.pdf", SAMPLE).await.unwrap());

        let payload = cache.get("https://x/a.pdf").await.unwrap();
        assert_eq!(payload.as_deref(), Some(SAMPLE));
        assert!(cache.exists("https://x/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_and_exists_miss_on_unknown_url() {
        let (_dir, cache) = create_test_cache();
        assert!(!cache.exists("https://x/never-put.pdf").await.unwrap());
        assert!(cache.get("https://x/never-put.pdf").await.unwrap().is_none());
        assert!(cache
            .get_entry("https://x/never-put.pdf")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_empty_url() {
        let (_dir, cache) = create_test_cache();
        let err = cache.put("", SAMPLE).await.unwrap_err();
        assert!(err.is_precondition(), "unexpected error: {err}");

        let err = cache.put("   ", SAMPLE).await.unwrap_err();
        assert!(err.is_precondition(), "unexpected error: {err}");

        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_rejects_empty_blob() {
        let (_dir, cache) = create_test_cache();
        let err = cache.put("https://x/a.pdf", &[]).await.unwrap_err();
        assert!(err.is_precondition(), "unexpected error: {err}");
        assert!(!cache.exists("https://x/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_second_put_same_url_returns_false_and_keeps_first() {
        let (_dir, cache) = create_test_cache();
        assert!(cache.put("https://x/a.pdf", b"first payload").await.unwrap());
        assert!(!cache.put("https://x/a.pdf", b"second payload").await.unwrap());

        let payload = cache.get("https://x/a.pdf").await.unwrap();
        assert_eq!(payload.as_deref(), Some(b"first payload".as_slice()));
        assert_eq!(cache.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replacing_a_record_is_delete_then_put() {
        let (_dir, cache) = create_test_cache();
        assert!(cache.put("https://x/a.pdf", b"first payload").await.unwrap());
        assert!(cache.delete("https://x/a.pdf").await.unwrap());
        assert!(cache.put("https://x/a.pdf", b"second payload").await.unwrap());

        let payload = cache.get("https://x/a.pdf").await.unwrap();
        assert_eq!(payload.as_deref(), Some(b"second payload".as_slice()));
    }

    #[tokio::test]
    async fn test_delete_returns_true_then_false() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", SAMPLE).await.unwrap();

        assert!(cache.delete("https://x/a.pdf").await.unwrap());
        assert!(!cache.exists("https://x/a.pdf").await.unwrap());
        assert!(!cache.delete("https://x/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_url_leaves_store_unchanged() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", SAMPLE).await.unwrap();

        assert!(!cache.delete("https://x/other.pdf").await.unwrap());
        assert!(cache.exists("https://x/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_returns_summaries_without_payload() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", b"aaaa").await.unwrap();
        cache.put("https://x/b.pdf", b"bb").await.unwrap();
        cache.put("https://x/c.pdf", b"cccccc").await.unwrap();

        let mut entries = cache.list().await.unwrap();
        entries.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].url, "https://x/a.pdf");
        assert_eq!(entries[0].file_size, 4);
        assert_eq!(entries[1].file_size, 2);
        assert_eq!(entries[2].file_size, 6);
    }

    #[tokio::test]
    async fn test_clear_twice_is_idempotent() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", SAMPLE).await.unwrap();
        cache.put("https://x/b.pdf", SAMPLE).await.unwrap();

        assert!(cache.clear().await.unwrap());
        assert!(cache.list().await.unwrap().is_empty());
        assert!(cache.clear().await.unwrap());
        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_get_entry() {
        let (_dir, cache) = create_test_cache();
        let mut metadata = Map::new();
        metadata.insert("course".to_string(), Value::from("calculus"));
        metadata.insert("unit".to_string(), Value::from(3));

        assert!(cache
            .put_with_metadata("https://x/calc.pdf", SAMPLE, metadata.clone())
            .await
            .unwrap());

        let record = cache.get_entry("https://x/calc.pdf").await.unwrap().unwrap();
        assert_eq!(record.metadata, metadata);
        assert_eq!(record.url, "https://x/calc.pdf");
        assert_eq!(record.file_size, SAMPLE.len() as u64);
        assert_eq!(record.blob, SAMPLE);
    }

    #[tokio::test]
    async fn test_get_entry_degrades_unreadable_metadata() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", SAMPLE).await.unwrap();

        raw_conn(&cache)
            .execute("UPDATE pdfs SET metadata = 'not json'", [])
            .unwrap();

        let record = cache.get_entry("https://x/a.pdf").await.unwrap().unwrap();
        assert!(record.metadata.is_empty());
        assert_eq!(record.blob, SAMPLE);
    }

    #[tokio::test]
    async fn test_opaque_identifier_keys_work() {
        let (_dir, cache) = create_test_cache();
        assert!(cache.put("pdf-42", SAMPLE).await.unwrap());
        assert!(cache.exists("pdf-42").await.unwrap());
        assert_eq!(cache.get("pdf-42").await.unwrap().as_deref(), Some(SAMPLE));
    }

    #[tokio::test]
    async fn test_storage_fault_degrades_every_operation() {
        let (_dir, cache) = create_test_cache();
        cache.put("https://x/a.pdf", SAMPLE).await.unwrap();

        raw_conn(&cache).execute_batch("DROP TABLE pdfs;").unwrap();

        assert!(!cache.exists("https://x/a.pdf").await.unwrap());
        assert!(cache.get("https://x/a.pdf").await.unwrap().is_none());
        assert!(cache.get_entry("https://x/a.pdf").await.unwrap().is_none());
        assert!(cache.list().await.unwrap().is_empty());
        assert!(!cache.delete("https://x/a.pdf").await.unwrap());
        assert!(!cache.put("https://x/b.pdf", SAMPLE).await.unwrap());
        assert!(!cache.clear().await.unwrap());
    }
}
