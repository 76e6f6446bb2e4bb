//! Cache record types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored PDF, as kept in the record store.
///
/// `url` is the logical cache key and is unique across records; `id` is a
/// write-time identifier kept for record identity only and is not used for
/// lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub id: String,
    pub url: String,
    pub blob: Vec<u8>,
    /// Timestamp of write, RFC 3339.
    pub download_date: String,
    /// Byte length of `blob`, derived at write time.
    pub file_size: u64,
    /// Caller-supplied extra fields; open extension point with no schema.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CacheRecord {
    /// Build a record for `blob` about to be written under `url`.
    ///
    /// Assigns the id and download date and derives `file_size` from the
    /// payload length.
    pub fn new(url: &str, blob: Vec<u8>, metadata: Map<String, Value>) -> Self {
        let file_size = blob.len() as u64;
        CacheRecord {
            id: generate_record_id(),
            url: url.to_string(),
            blob,
            download_date: Utc::now().to_rfc3339(),
            file_size,
            metadata,
        }
    }

    /// Project the payload-free summary used by listings.
    pub fn summary(&self) -> PdfSummary {
        PdfSummary {
            url: self.url.clone(),
            download_date: self.download_date.clone(),
            file_size: self.file_size,
        }
    }
}

/// Listing entry: everything about a stored PDF except the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSummary {
    pub url: String,
    pub download_date: String,
    pub file_size: u64,
}

/// Write-time record identifier: UTC milliseconds plus a random component.
///
/// Collisions are not load-bearing — `url` is the real key — but the random
/// suffix keeps same-millisecond writes distinct.
fn generate_record_id() -> String {
    format!(
        "{}-{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
