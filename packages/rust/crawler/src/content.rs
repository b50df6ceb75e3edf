//! Primary content-region extraction.

use scraper::{Html, Selector};

/// Return the outer HTML of the document's `<body>`, or `None` if it has none.
///
/// Callers treat `None` as an empty page rather than an error.
pub fn extract_body(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let body_sel = Selector::parse("body").ok()?;
    doc.select(&body_sel).next().map(|body| body.html())
}
