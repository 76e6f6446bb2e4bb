//! Papershelf - durable local cache for downloaded PDFs.
//!
//! This crate is the storage core of a PDF study-material viewer: a keyed
//! blob cache over an embedded SQLite database. The viewer checks the cache
//! before fetching from the network and writes fetched bytes back for next
//! time; fetching itself, list presentation, and rendering live in the
//! embedding application, not here.
//!
//! Reads are fail-safe: when storage misbehaves, `exists` and `get` report
//! "not cached" (with a logged warning) so the caller simply refetches.
//! Writes reject invalid input loudly and report storage faults as `false`.
//!
//! # Example
//!
//! ```rust,ignore
//! use papershelf::PdfCache;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> papershelf::Result<()> {
//!     let cache = PdfCache::new(papershelf::paths::default_db_path()?);
//!
//!     let url = "https://example.com/materials/calc-1.pdf";
//!     let bytes = match cache.get(url).await? {
//!         Some(bytes) => bytes,
//!         None => {
//!             let bytes = fetch_from_catalog(url).await?; // embedder-provided
//!             cache.put(url, &bytes).await?;
//!             bytes
//!         }
//!     };
//!     println!("{} bytes ready to render", bytes.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod paths;
pub mod records;
pub mod store;

// Re-export commonly used types
pub use cache::PdfCache;
pub use error::{PapershelfError, Result};
pub use records::{CacheRecord, PdfSummary};
pub use store::StorageHandle;
