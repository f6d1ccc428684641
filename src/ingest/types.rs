// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// A known feed source offered to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            description: description.to_string(),
        }
    }
}

/// One entry of a fetched feed. Every field is a string; missing values are `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    // Wire name kept as `pubDate` for the web UI.
    #[serde(rename = "pubDate")]
    pub publication_date: String,
    pub description: String,
}
