//! Feed parser: RSS 2.0 / Atom / RDF XML into a flat list of [`FeedItem`]s.
//!
//! The XML is first read into a generic element tree with lowercased,
//! prefix-free names (`rdf:RDF` → `rdf`, `pubDate` → `pubdate`), trimmed and
//! whitespace-collapsed text, and CDATA kept as text. Format detection then
//! walks that tree:
//!
//! 1. `rss > channel` → RSS 2.0 (`item` children)
//! 2. `feed` with at least one `entry` → Atom
//! 3. `rdf` with at least one `item`   → RDF / RSS 1.0
//!
//! Anything else is [`FeedError::UnrecognizedFormat`].

use std::time::Instant;

use metrics::{counter, histogram};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use crate::ingest::error::FeedError;
use crate::ingest::types::FeedItem;

/// Element of the generic feed tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn open(e: &BytesStart<'_>) -> Self {
        let attrs = e
            .attributes()
            .flatten()
            .map(|a| {
                let key = normalize_name(a.key.local_name().as_ref());
                let value = a
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| {
                        html_escape::decode_html_entities(&String::from_utf8_lossy(&a.value))
                            .into_owned()
                    });
                (key, value)
            })
            .collect();

        Self {
            name: normalize_name(e.local_name().as_ref()),
            attrs,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// First child with the given (normalized) name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Own text, or the joined text of descendants when the element only wraps markup.
    pub fn inner_text(&self) -> String {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        self.children
            .iter()
            .map(XmlNode::inner_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of the first non-empty child among `names`, tried in order. `""` if none.
    pub fn text_of(&self, names: &[&str]) -> String {
        for name in names {
            for child in self.children_named(name) {
                let t = child.inner_text();
                if !t.is_empty() {
                    return t;
                }
            }
        }
        String::new()
    }

    fn push_text(&mut self, chunk: &str) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(chunk);
    }

    fn close(mut self) -> Self {
        self.text = collapse_whitespace(&self.text);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
    Rdf,
}

/// Reject bodies that cannot be XML before handing them to the reader.
pub fn ensure_xml(body: &str) -> Result<(), FeedError> {
    if body.trim_start().starts_with('<') {
        Ok(())
    } else {
        Err(FeedError::NotXml)
    }
}

/// Parse a feed document into items, in document order.
pub fn parse(xml: &str) -> Result<Vec<FeedItem>, FeedError> {
    ensure_xml(xml)?;

    let t0 = Instant::now();
    let root = parse_tree(xml)?;
    let (format, entries) = detect(&root)?;

    let items: Vec<FeedItem> = entries
        .into_iter()
        .map(|entry| match format {
            FeedFormat::Atom => atom_item(entry),
            FeedFormat::Rss | FeedFormat::Rdf => rss_item(entry),
        })
        .collect();

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_items_total").increment(items.len() as u64);
    tracing::debug!(?format, items = items.len(), parse_ms = ms, "feed parsed");

    Ok(items)
}

/// Read the whole document into an [`XmlNode`] tree and return its root element.
pub fn parse_tree(xml: &str) -> Result<XmlNode, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(XmlNode::open(&e)),
            Event::Empty(e) => attach(&mut stack, &mut root, XmlNode::open(&e))?,
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FeedError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&decode_text(&e));
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| FeedError::Xml("document has no root element".to_string()))
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), FeedError> {
    let node = node.close();
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(FeedError::Xml("multiple root elements".to_string()));
        }
        None => *root = Some(node),
    }
    Ok(())
}

/// Pick the feed format and its entry elements. An RSS channel without items yields none;
/// Atom and RDF roots are only recognized when they carry at least one entry.
pub fn detect(root: &XmlNode) -> Result<(FeedFormat, Vec<&XmlNode>), FeedError> {
    if root.name == "rss" {
        if let Some(channel) = root.child("channel") {
            return Ok((FeedFormat::Rss, channel.children_named("item").collect()));
        }
    }
    if root.name == "feed" {
        let entries: Vec<&XmlNode> = root.children_named("entry").collect();
        if !entries.is_empty() {
            return Ok((FeedFormat::Atom, entries));
        }
    }
    if root.name == "rdf" {
        let items: Vec<&XmlNode> = root.children_named("item").collect();
        if !items.is_empty() {
            return Ok((FeedFormat::Rdf, items));
        }
    }
    tracing::warn!(root = %root.name, "unrecognized feed format");
    Err(FeedError::UnrecognizedFormat)
}

fn rss_item(item: &XmlNode) -> FeedItem {
    FeedItem {
        title: item.text_of(&["title"]),
        link: item.text_of(&["link"]),
        publication_date: item.text_of(&["pubdate", "date"]),
        description: item.text_of(&["description", "summary", "content"]),
    }
}

fn atom_item(entry: &XmlNode) -> FeedItem {
    FeedItem {
        title: entry.text_of(&["title"]),
        link: atom_link(entry),
        publication_date: entry.text_of(&["published", "updated"]),
        description: entry.text_of(&["summary", "content"]),
    }
}

/// `href` of the alternate (or rel-less) link, then any link `href`, then link text.
fn atom_link(entry: &XmlNode) -> String {
    let links: Vec<&XmlNode> = entry.children_named("link").collect();

    let alternate = links.iter().find_map(|l| {
        let rel = l.attr("rel").unwrap_or("alternate");
        if rel.eq_ignore_ascii_case("alternate") {
            l.attr("href").filter(|h| !h.is_empty())
        } else {
            None
        }
    });
    if let Some(href) = alternate {
        return href.to_string();
    }

    if let Some(href) = links
        .iter()
        .find_map(|l| l.attr("href").filter(|h| !h.is_empty()))
    {
        return href.to_string();
    }

    entry.text_of(&["link"])
}

fn decode_text(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(s) => s.into_owned(),
        // HTML entities such as `&nbsp;` are common in press feeds but unknown to XML.
        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(e)).into_owned(),
    }
}

fn normalize_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
