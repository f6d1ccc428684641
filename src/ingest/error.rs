//! Error types for feed ingestion (fetch, parse, registry).

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The fetch did not complete within the configured timeout.
    #[error("Timed out after {}s fetching RSS feed from {url}", .after.as_secs_f32())]
    Timeout { url: String, after: Duration },

    /// The feed server answered with a non-2xx status.
    #[error("Failed to fetch RSS feed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Response is not in XML format")]
    NotXml,

    #[error("Unrecognized feed format")]
    UnrecognizedFormat,

    /// Malformed XML.
    #[error("Failed to parse feed XML: {0}")]
    Xml(String),

    #[error("Failed to fetch RSS feed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Feed registry error: {0}")]
    Registry(String),
}

impl FeedError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Timeout { .. } => "timeout",
            FeedError::Http { .. } => "http",
            FeedError::NotXml => "not_xml",
            FeedError::UnrecognizedFormat => "unrecognized_format",
            FeedError::Xml(_) => "xml",
            FeedError::Transport(_) => "transport",
            FeedError::Registry(_) => "registry",
        }
    }
}

impl From<quick_xml::Error> for FeedError {
    fn from(e: quick_xml::Error) -> Self {
        FeedError::Xml(e.to_string())
    }
}
