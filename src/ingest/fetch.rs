// src/ingest/fetch.rs
use std::time::{Duration, Instant};

use metrics::{counter, histogram};

use crate::ingest::error::FeedError;
use crate::ingest::parse::ensure_xml;

/// Hard upper bound for a single feed fetch (send + body).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Several police press portals reject unknown agents, so we present a desktop browser.
pub const FEED_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Single-attempt feed fetcher. Cheap to clone; the reqwest pool is shared.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// GET `url` and return the raw body. The caller validates `url` first.
    pub async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        counter!("feed_fetch_total").increment(1);
        let t0 = Instant::now();

        // Dropping the inner future on timeout aborts the in-flight request.
        let res = match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(res) => res,
            Err(_) => Err(FeedError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }),
        };

        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        if let Err(e) = &res {
            tracing::warn!(error = %e, kind = e.kind(), %url, "feed fetch failed");
            counter!("feed_fetch_errors_total", "kind" => e.kind()).increment(1);
        }
        res
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, FeedError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, FEED_USER_AGENT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        ensure_xml(&body)?;
        Ok(body)
    }
}
