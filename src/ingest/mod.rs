// src/ingest/mod.rs
pub mod error;
pub mod fetch;
pub mod parse;
pub mod registry;
pub mod types;

pub use error::FeedError;
pub use fetch::FeedFetcher;
pub use registry::FeedRegistry;
pub use types::{FeedItem, FeedSource};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_fetch_total", "Feed fetches attempted.");
        describe_counter!(
            "feed_fetch_errors_total",
            "Feed fetch failures by kind (timeout, http, not_xml, transport)."
        );
        describe_histogram!("feed_fetch_ms", "Feed fetch time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("feed_items_total", "Items produced by the feed parser.");
    });
}

/// Fetch `url` and parse it into items. Single attempt, no retry.
pub async fn read_feed(fetcher: &FeedFetcher, url: &str) -> Result<Vec<FeedItem>, FeedError> {
    ensure_metrics_described();

    tracing::info!(%url, "fetching feed");
    let xml = fetcher.fetch(url).await?;
    let items = parse::parse(&xml).inspect_err(|e| {
        tracing::warn!(error = %e, %url, "feed parse failed");
    })?;
    tracing::info!(%url, items = items.len(), "feed read");
    Ok(items)
}
