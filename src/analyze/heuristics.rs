//! Heuristic (non-LLM) feed description analyzer.
//!
//! Pure function of the description string: builds a one-document
//! [`DescriptionIndex`], then derives domain, locations, content type,
//! language and top keywords with fixed term lists and regexes.
//! Used directly and as the `analyze_feed_description` tool of the feed agent.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyze::index::{DescriptionIndex, IndexedDoc};

/// Returned by [`describe_feed`] instead of a report when the analysis cannot be produced.
pub const ANALYSIS_ERROR: &str = "Error: Failed to analyze the feed description.";

pub const ANALYSIS_METHOD: &str = "Description-based analysis using an in-memory full-text index";

const DOC_ID: &str = "feed-description";
const LOCATION_QUERY: &str = "police department region state city";

const DOMAIN_WORDS: [&str; 6] = [
    "polizei",
    "police",
    "news",
    "department",
    "government",
    "official",
];

const POLICE_TERMS: [&str; 8] = [
    "polizei",
    "police",
    "emergency",
    "crime",
    "incident",
    "arrest",
    "law",
    "enforcement",
];
const NEWS_TERMS: [&str; 6] = ["news", "update", "report", "latest", "breaking", "nachrichten"];
const GOVERNMENT_TERMS: [&str; 6] = [
    "government",
    "official",
    "authority",
    "ministry",
    "regierung",
    "behörde",
];

const GERMAN_WORDS: [&str; 8] = ["und", "der", "die", "das", "polizei", "nach", "wurde", "uhr"];
const ENGLISH_WORDS: [&str; 7] = ["the", "and", "police", "was", "were", "after", "reported"];

const STOP_WORDS: [&str; 16] = [
    "and", "the", "or", "in", "on", "at", "to", "for", "with", "by", "from", "a", "an",
    "official", "feed", "rss",
];

const MAX_KEYWORDS: usize = 5;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("url regex"));
static AUTHORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://([^/]+)").expect("authority regex"));
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:in|of|from|for)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").expect("location regex")
});
static GERMAN_RES: Lazy<Vec<Regex>> = Lazy::new(|| word_regexes(&GERMAN_WORDS));
static ENGLISH_RES: Lazy<Vec<Regex>> = Lazy::new(|| word_regexes(&ENGLISH_WORDS));

fn word_regexes(words: &[&str]) -> Vec<Regex> {
    words
        .iter()
        .map(|w| Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("word regex"))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "Police reports and safety information")]
    Police,
    #[serde(rename = "News and media updates")]
    News,
    #[serde(rename = "Government announcements and reports")]
    Government,
    #[serde(rename = "General news and updates")]
    General,
}

impl ContentType {
    pub fn label(self) -> &'static str {
        match self {
            ContentType::Police => "Police reports and safety information",
            ContentType::News => "News and media updates",
            ContentType::Government => "Government announcements and reports",
            ContentType::General => "General news and updates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    German,
    English,
    #[serde(rename = "Unknown (possibly English)")]
    Unknown,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::German => "German",
            Language::English => "English",
            Language::Unknown => "Unknown (possibly English)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedAnalysis {
    pub description: String,
    pub possible_url: Option<String>,
    pub domain: String,
    pub content_type: ContentType,
    pub language_detected: Language,
    /// Deduplicated candidates, or `["Unknown"]`.
    pub potential_locations: Vec<String>,
    /// At most five, most frequent first.
    pub top_keywords: Vec<String>,
    pub analysis_method: String,
}

impl FeedAnalysis {
    pub fn has_locations(&self) -> bool {
        self.potential_locations.first().map(String::as_str) != Some("Unknown")
    }

    /// One-paragraph human readable summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "This RSS feed appears to contain {} content in {}. It likely originates from {}.",
            self.content_type.label(),
            self.language_detected.label(),
            self.domain
        );
        if self.has_locations() {
            out.push_str(&format!(
                " The feed may be related to the following locations: {}.",
                self.potential_locations.join(", ")
            ));
        }
        if !self.top_keywords.is_empty() {
            out.push_str(&format!(
                " Key topics include: {}.",
                self.top_keywords.join(", ")
            ));
        }
        out
    }
}

/// Tool-result document: analysis plus its summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub feed_analysis: FeedAnalysis,
    pub summary: String,
}

/// Analyze one feed description.
pub fn analyze(description: &str) -> FeedAnalysis {
    let mut index = DescriptionIndex::default();
    index.add(IndexedDoc {
        id: DOC_ID.to_string(),
        title: description.to_string(),
        description: description.to_string(),
        content: description.to_string(),
    });

    let (possible_url, domain) = extract_domain(description);
    let potential_locations = extract_locations(&index);
    let content_type = classify(&index);
    let language_detected = detect_language(description, &domain);
    let top_keywords = top_keywords(description);

    FeedAnalysis {
        description: description.to_string(),
        possible_url,
        domain,
        content_type,
        language_detected,
        potential_locations,
        top_keywords,
        analysis_method: ANALYSIS_METHOD.to_string(),
    }
}

/// Pretty JSON [`FeedReport`] for `description`, or [`ANALYSIS_ERROR`]. Never fails.
pub fn describe_feed(description: &str) -> String {
    guarded(|| {
        let feed_analysis = analyze(description);
        let report = FeedReport {
            summary: feed_analysis.summary(),
            feed_analysis,
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            tracing::error!(error = %e, "feed report serialization failed");
            ANALYSIS_ERROR.to_string()
        })
    })
}

/// Runs `report`, mapping a panic to [`ANALYSIS_ERROR`].
fn guarded<F>(report: F) -> String
where
    F: FnOnce() -> String + std::panic::UnwindSafe,
{
    match std::panic::catch_unwind(report) {
        Ok(out) => out,
        Err(_) => {
            tracing::error!("feed analysis panicked");
            ANALYSIS_ERROR.to_string()
        }
    }
}

fn extract_domain(description: &str) -> (Option<String>, String) {
    if let Some(m) = URL_RE.find(description) {
        let url = m.as_str().to_string();
        let domain = AUTHORITY_RE
            .captures(&url)
            .and_then(|c| c.get(1))
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| "unknown-domain".to_string());
        return (Some(url), domain);
    }

    let lower = description.to_lowercase();
    let domain = DOMAIN_WORDS
        .iter()
        .find(|w| lower.contains(*w))
        .map(|w| w.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    (None, domain)
}

fn extract_locations(index: &DescriptionIndex) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if let Some(hits) = index.search(LOCATION_QUERY).first() {
        for id in &hits.ids {
            let Some(doc) = index.get(id) else { continue };
            for caps in LOCATION_RE.captures_iter(&doc.content) {
                let loc = caps[1].to_string();
                if !out.contains(&loc) {
                    out.push(loc);
                }
            }
        }
    }
    if out.is_empty() {
        out.push("Unknown".to_string());
    }
    out
}

fn score(index: &DescriptionIndex, terms: &[&str]) -> usize {
    terms.iter().map(|t| index.hit_count(t)).sum()
}

/// Highest score wins; ties resolve police, then government, then news.
fn classify(index: &DescriptionIndex) -> ContentType {
    let police = score(index, &POLICE_TERMS);
    let news = score(index, &NEWS_TERMS);
    let government = score(index, &GOVERNMENT_TERMS);

    let max = police.max(news).max(government);
    if max == 0 {
        ContentType::General
    } else if police == max {
        ContentType::Police
    } else if government == max {
        ContentType::Government
    } else {
        ContentType::News
    }
}

fn detect_language(description: &str, domain: &str) -> Language {
    let lower = description.to_lowercase();
    let german = GERMAN_RES.iter().filter(|re| re.is_match(&lower)).count();
    let english = ENGLISH_RES.iter().filter(|re| re.is_match(&lower)).count();

    if german > english {
        Language::German
    } else if english > german {
        Language::English
    } else if description.contains(".de") || domain.contains(".de") {
        Language::German
    } else {
        Language::Unknown
    }
}

fn top_keywords(description: &str) -> Vec<String> {
    let cleaned: String = description
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    // (word, count) in first-seen order
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        match slot.get(word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(word.to_string(), counts.len());
                counts.push((word.to_string(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by_key(|c| std::cmp::Reverse(c.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(w, _)| w)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_police_snippet() {
        let a = analyze("polizei nach Raub in Berlin");
        assert_eq!(a.language_detected, Language::German);
        assert_eq!(a.content_type, ContentType::Police);
        assert_eq!(a.domain, "polizei");
        assert_eq!(a.potential_locations, vec!["Unknown"]);
        assert_eq!(a.top_keywords, vec!["polizei", "nach", "raub", "berlin"]);
    }

    #[test]
    fn empty_description_gives_sentinels() {
        let a = analyze("");
        assert_eq!(a.domain, "unknown");
        assert_eq!(a.possible_url, None);
        assert_eq!(a.potential_locations, vec!["Unknown"]);
        assert!(a.top_keywords.is_empty());
        assert_eq!(a.content_type, ContentType::General);
        assert_eq!(a.language_detected, Language::Unknown);
    }

    #[test]
    fn url_sets_domain_and_keywords_keep_first_seen_order() {
        let a = analyze(
            "Pressemeldungen der Polizei https://polizei.brandenburg.de/pressemeldungen/rss",
        );
        assert_eq!(
            a.possible_url.as_deref(),
            Some("https://polizei.brandenburg.de/pressemeldungen/rss")
        );
        assert_eq!(a.domain, "polizei.brandenburg.de");
        assert_eq!(
            a.top_keywords,
            vec!["pressemeldungen", "polizei", "https", "brandenburg"]
        );
    }

    #[test]
    fn stop_words_and_short_tokens_never_become_keywords() {
        let a = analyze("the official feed official feed rss RSS rss news news news");
        assert_eq!(a.top_keywords, vec!["news"]);
    }

    #[test]
    fn keywords_are_capped_at_five() {
        let a = analyze("alpha bravo charlie delta echoes foxtrot golf");
        assert_eq!(a.top_keywords.len(), 5);
        assert_eq!(a.top_keywords[0], "alpha");
    }

    #[test]
    fn content_type_ties_prefer_police_then_government() {
        assert_eq!(analyze("police ministry").content_type, ContentType::Police);
        assert_eq!(analyze("ministry news").content_type, ContentType::Government);
        assert_eq!(analyze("breaking news").content_type, ContentType::News);
    }

    #[test]
    fn locations_come_from_context_hits() {
        let a = analyze("police department region state city reports from Potsdam and Cottbus");
        assert_eq!(a.potential_locations, vec!["Potsdam"]);
        assert!(a.summary().contains("following locations: Potsdam."));
    }

    #[test]
    fn language_tie_falls_back_to_de_domain() {
        assert_eq!(
            analyze("Meldungen von example.de").language_detected,
            Language::German
        );
        assert_eq!(
            analyze("the police reported after").language_detected,
            Language::English
        );
    }

    #[test]
    fn equal_word_hits_without_de_are_unknown() {
        assert_eq!(
            analyze("polizei police").language_detected,
            Language::Unknown
        );
    }

    #[test]
    fn panicking_report_yields_error_sentinel() {
        assert_eq!(guarded(|| panic!("boom")), ANALYSIS_ERROR);
        assert_eq!(guarded(|| "ok".to_string()), "ok");
    }

    #[test]
    fn report_is_json_with_analysis_and_summary() {
        let out = describe_feed("Police department of Berlin");
        let v: serde_json::Value = serde_json::from_str(&out).expect("json report");
        assert_eq!(v["feedAnalysis"]["domain"], "police");
        assert_eq!(
            v["feedAnalysis"]["contentType"],
            "Police reports and safety information"
        );
        assert!(v["summary"]
            .as_str()
            .unwrap()
            .starts_with("This RSS feed appears to contain Police reports"));
    }
}
