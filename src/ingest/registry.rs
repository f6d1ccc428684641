//! Feed registry: the list of known police press feeds offered to the user.
//!
//! Resolution order for [`FeedRegistry::load_default`]:
//! 1) `$FEED_REGISTRY_PATH` (must exist)
//! 2) `config/feeds.toml`
//! 3) `config/feeds.json`
//! 4) built-in backup list
//!
//! TOML files use `[[feeds]]` tables; JSON files are a plain array of sources.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::error::FeedError;
use crate::ingest::types::FeedSource;

pub const ENV_FEED_REGISTRY_PATH: &str = "FEED_REGISTRY_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRegistry {
    feeds: Vec<FeedSource>,
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeedRegistry {
    /// Backup feeds known to serve valid XML.
    pub fn builtin() -> Self {
        Self {
            feeds: vec![
                FeedSource::new(
                    "Polizei Brandenburg",
                    "https://polizei.brandenburg.de/pressemeldungen/rss/region/57581",
                    "Police department of Brandenburg state",
                ),
                FeedSource::new(
                    "Polizei Berlin",
                    "https://www.berlin.de/polizei/polizeimeldungen/index.php/rss",
                    "Police department of Berlin",
                ),
                FeedSource::new(
                    "Polizei Schleswig-Holstein",
                    "https://www.schleswig-holstein.de/DE/landesregierung/ministerien-behoerden/POLIZEI/RSS_Funktionalitaet/RSS_Taeterfahndung/RSSNewsfeed_Taeterfahndung.xml?nn=7b019c0c-7697-4f3f-a7d2-751e887914f6",
                    "RSS feed for wanted persons from the Schleswig-Holstein police",
                ),
            ],
        }
    }

    /// Build from arbitrary sources: blanks dropped, deduplicated by URL,
    /// falls back to [`FeedRegistry::builtin`] when nothing usable remains.
    pub fn from_sources(sources: Vec<FeedSource>) -> Self {
        let feeds = clean_list(sources);
        if feeds.is_empty() {
            tracing::warn!("feed registry is empty, using built-in feeds");
            return Self::builtin();
        }
        Self { feeds }
    }

    pub fn load_from(path: &Path) -> Result<Self, FeedError> {
        let content = fs::read_to_string(path).map_err(|e| {
            FeedError::Registry(format!("reading {}: {e}", path.display()))
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let sources = parse_sources(&content, &ext)?;
        tracing::info!(path = %path.display(), feeds = sources.len(), "feed registry loaded");
        Ok(Self::from_sources(sources))
    }

    pub fn load_default() -> Result<Self, FeedError> {
        if let Ok(p) = std::env::var(ENV_FEED_REGISTRY_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(FeedError::Registry(format!(
                    "{ENV_FEED_REGISTRY_PATH} points to non-existent path {}",
                    pb.display()
                )));
            }
            return Self::load_from(&pb);
        }
        for candidate in ["config/feeds.toml", "config/feeds.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::builtin())
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>, FeedError> {
    #[derive(serde::Deserialize)]
    struct TomlFeeds {
        feeds: Vec<FeedSource>,
    }

    if hint_ext == "toml" {
        return toml::from_str::<TomlFeeds>(s)
            .map(|t| t.feeds)
            .map_err(|e| FeedError::Registry(format!("invalid TOML registry: {e}")));
    }
    if let Ok(v) = serde_json::from_str::<Vec<FeedSource>>(s) {
        return Ok(v);
    }
    toml::from_str::<TomlFeeds>(s)
        .map(|t| t.feeds)
        .map_err(|_| FeedError::Registry("unsupported feed registry format".to_string()))
}

fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|f| FeedSource {
            name: f.name.trim().to_string(),
            url: f.url.trim().to_string(),
            description: f.description.trim().to_string(),
        })
        .filter(|f| !f.name.is_empty() && !f.url.is_empty())
        .filter(|f| seen.insert(f.url.clone()))
        .collect()
}
