//! Basic usage example - cache a payload, list the shelf, read it back

use papershelf::{PdfCache, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Get a database path from args or use a local file
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./papershelf-demo.db".to_string());

    println!("Opening PDF cache at: {}", db_path);
    let cache = PdfCache::new(&db_path);

    let url = "https://example.com/materials/calc-1.pdf";

    // The viewer flow: check the cache, fall back to "the network", write back.
    let bytes = match cache.get(url).await? {
        Some(bytes) => {
            println!("Cache hit for {}", url);
            bytes
        }
        None => {
            println!("Cache miss for {}, fetching...", url);
            let bytes = b"%PDF-1.4 demo payload".to_vec();
            if cache.put(url, &bytes).await? {
                println!("Stored {} bytes", bytes.len());
            }
            bytes
        }
    };
    println!("{} bytes ready to render", bytes.len());

    println!("Stored PDFs:");
    for entry in cache.list().await? {
        println!(
            "  - {} ({} bytes, downloaded {})",
            entry.url, entry.file_size, entry.download_date
        );
    }

    Ok(())
}
