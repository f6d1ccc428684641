// tests/feed_parse.rs
//
// Parser behaviour over realistic RSS 2.0, Atom and RSS 1.0 (RDF) documents.

use police_ticker::ingest::parse::parse;
use police_ticker::ingest::{FeedError, FeedItem};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

#[test]
fn rss_items_keep_document_order_and_fields() {
    let items = parse(&fixture("polizei_brandenburg.rss.xml")).expect("parse rss");
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].title, "Einbruch in Einfamilienhaus in Potsdam");
    assert_eq!(
        items[0].link,
        "https://polizei.brandenburg.de/pressemeldung/einbruch-potsdam/1"
    );
    assert_eq!(items[0].publication_date, "Mon, 14 Oct 2024 09:12:00 +0200");
    assert!(items[0].description.contains("Zeppelinstraße"));

    assert_eq!(items[1].title, "Verkehrsunfall auf der A10 & Stau");

    // dc:date stands in for pubDate; no description means empty string.
    assert_eq!(items[2].publication_date, "2024-10-13T22:05:00+02:00");
    assert_eq!(items[2].description, "");
}

#[test]
fn single_item_feed_yields_one_element() {
    let items = parse(&fixture("single_item.rss.xml")).expect("parse single");
    assert_eq!(
        items,
        vec![FeedItem {
            title: "Festnahme nach Taschendiebstahl".into(),
            link: "https://www.berlin.de/polizei/polizeimeldungen/2024/pressemitteilung.1.php"
                .into(),
            publication_date: "Sun, 13 Oct 2024 18:00:00 +0200".into(),
            description: "Zivilfahnder nahmen am Alexanderplatz einen Mann fest.".into(),
        }]
    );
}

#[test]
fn atom_entries_use_href_and_fallback_dates() {
    let items = parse(&fixture("presseportal.atom.xml")).expect("parse atom");
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].link, "https://www.presseportal.de/blaulicht/pm/14626/1");
    assert_eq!(items[0].publication_date, "2024-10-14T09:30:00Z");
    assert!(items[0].description.starts_with("Feuerwehr und Polizei"));

    assert_eq!(items[1].link, "https://www.presseportal.de/blaulicht/pm/14626/2");
    assert_eq!(items[1].publication_date, "2024-10-14T08:00:00Z");
    assert_eq!(items[1].description, "Die seit gestern vermisste Frau ist wieder da.");
}

#[test]
fn rdf_documents_are_recognized() {
    let items = parse(&fixture("landespolizei.rdf.xml")).expect("parse rdf");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Kontrollen auf der B76");
    assert_eq!(items[0].publication_date, "2024-10-12T12:00:00+02:00");
}

#[test]
fn unknown_root_is_unrecognized() {
    let err = parse("<opml><body/></opml>").unwrap_err();
    assert!(matches!(err, FeedError::UnrecognizedFormat));
    assert_eq!(err.to_string(), "Unrecognized feed format");
}

#[test]
fn atom_feed_without_entries_is_unrecognized() {
    let err = parse("<feed xmlns=\"http://www.w3.org/2005/Atom\"><title>t</title></feed>")
        .unwrap_err();
    assert!(matches!(err, FeedError::UnrecognizedFormat));
}

#[test]
fn rdf_without_items_is_unrecognized() {
    let xml = concat!(
        "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">",
        "<channel><title>t</title></channel>",
        "</rdf:RDF>"
    );
    assert!(matches!(parse(xml), Err(FeedError::UnrecognizedFormat)));
}

#[test]
fn html_is_not_xml() {
    let err = parse("Service Unavailable").unwrap_err();
    assert!(matches!(err, FeedError::NotXml));
}

#[test]
fn mismatched_tags_are_xml_errors() {
    let err = parse("<rss><channel><item><title>x</item></channel></rss>").unwrap_err();
    assert!(matches!(err, FeedError::Xml(_)), "got {err:?}");
}

#[test]
fn items_serialize_with_pub_date_key() {
    let items = parse(&fixture("single_item.rss.xml")).unwrap();
    let v = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(v["pubDate"], "Sun, 13 Oct 2024 18:00:00 +0200");
    assert!(v.get("publication_date").is_none());
}
