//! Ephemeral in-memory full-text index used by the heuristic feed analyzer.
//!
//! - Forward tokenization: every prefix of every token is indexed, so `polizei`
//!   hits `Polizeibericht`.
//! - Bidirectional context: in a multi-term query each adjacent pair of terms
//!   must occur within `depth` token positions of each other, in either order.
//! - Results are grouped per field, like `[{field, ids}]`.

use std::collections::HashMap;

/// Indexed fields, in result order.
pub const FIELDS: [&str; 3] = ["title", "description", "content"];

/// Default context depth for multi-term queries.
pub const DEFAULT_CONTEXT_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct IndexedDoc {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
}

impl IndexedDoc {
    fn field(&self, field: &str) -> &str {
        match field {
            "title" => &self.title,
            "description" => &self.description,
            _ => &self.content,
        }
    }
}

/// Hits for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHits {
    pub field: &'static str,
    pub ids: Vec<String>,
}

/// prefix → token positions, for one (doc, field).
type PostingMap = HashMap<String, Vec<usize>>;

#[derive(Debug)]
pub struct DescriptionIndex {
    depth: usize,
    docs: Vec<IndexedDoc>,
    // postings[doc][field]
    postings: Vec<[PostingMap; 3]>,
}

impl Default for DescriptionIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_DEPTH)
    }
}

impl DescriptionIndex {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            docs: Vec::new(),
            postings: Vec::new(),
        }
    }

    pub fn add(&mut self, doc: IndexedDoc) {
        let postings = FIELDS.map(|f| forward_postings(doc.field(f)));
        self.docs.push(doc);
        self.postings.push(postings);
    }

    pub fn get(&self, id: &str) -> Option<&IndexedDoc> {
        self.docs.iter().find(|d| d.id == id)
    }

    /// Search all fields. Empty queries return no hits.
    pub fn search(&self, query: &str) -> Vec<FieldHits> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (fi, field) in FIELDS.into_iter().enumerate() {
            let ids: Vec<String> = self
                .docs
                .iter()
                .zip(&self.postings)
                .filter(|(_, p)| self.matches(&p[fi], &terms))
                .map(|(d, _)| d.id.clone())
                .collect();
            if !ids.is_empty() {
                out.push(FieldHits { field, ids });
            }
        }
        out
    }

    /// Total hits across fields.
    pub fn hit_count(&self, query: &str) -> usize {
        self.search(query).iter().map(|h| h.ids.len()).sum()
    }

    fn matches(&self, postings: &PostingMap, terms: &[String]) -> bool {
        let positions: Option<Vec<&Vec<usize>>> =
            terms.iter().map(|t| postings.get(t.as_str())).collect();
        let Some(positions) = positions else {
            return false;
        };
        positions
            .windows(2)
            .all(|pair| within_depth(pair[0], pair[1], self.depth))
    }
}

fn within_depth(a: &[usize], b: &[usize], depth: usize) -> bool {
    a.iter().any(|&i| b.iter().any(|&j| i != j && i.abs_diff(j) <= depth))
}

/// Lowercased alphanumeric tokens.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn forward_postings(text: &str) -> PostingMap {
    let mut map: PostingMap = HashMap::new();
    for (pos, token) in tokenize(text).into_iter().enumerate() {
        let mut prefix = String::with_capacity(token.len());
        for ch in token.chars() {
            prefix.push(ch);
            let slot = map.entry(prefix.clone()).or_default();
            if slot.last() != Some(&pos) {
                slot.push(pos);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(text: &str) -> DescriptionIndex {
        let mut idx = DescriptionIndex::default();
        idx.add(IndexedDoc {
            id: "doc".into(),
            title: text.into(),
            description: text.into(),
            content: text.into(),
        });
        idx
    }

    #[test]
    fn prefix_terms_hit_every_field() {
        let idx = index_of("Polizeibericht aus Potsdam");
        assert_eq!(idx.hit_count("polizei"), 3);
        assert_eq!(idx.hit_count("POTS"), 3);
        assert_eq!(idx.hit_count("bericht"), 0, "only prefixes are indexed");
    }

    #[test]
    fn context_requires_terms_close_together_in_either_order() {
        let idx = index_of("city and police department");
        assert_eq!(idx.hit_count("police city"), 3, "distance 2 in reverse order");
        let far = index_of("police reports from the whole city");
        assert_eq!(far.hit_count("police city"), 0);
    }

    #[test]
    fn results_are_grouped_per_field() {
        let mut idx = DescriptionIndex::default();
        idx.add(IndexedDoc {
            id: "a".into(),
            title: "Feed".into(),
            description: "crime".into(),
            content: "crime".into(),
        });
        let hits = idx.search("crime");
        let fields: Vec<&str> = hits.iter().map(|h| h.field).collect();
        assert_eq!(fields, vec!["description", "content"]);
        assert_eq!(idx.get("a").map(|d| d.content.as_str()), Some("crime"));
    }

    #[test]
    fn empty_query_and_empty_doc_yield_nothing() {
        let idx = index_of("");
        assert!(idx.search("").is_empty());
        assert!(idx.search("police").is_empty());
    }
}
