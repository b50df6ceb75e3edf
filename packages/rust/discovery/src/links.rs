//! Link extraction and filtering for the index document.

use std::sync::LazyLock;

use folio_shared::LinkEntry;
use folio_shared::sanitize::fold_upper;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::DiscoveryOptions;

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));

/// Extract page links from an index document, in document order.
///
/// A link is kept when its visible text is non-empty and not blacklisted,
/// and its target ends with the page extension and is not a `mailto:`.
/// Duplicates are preserved.
pub fn extract_links(html: &str, opts: &DiscoveryOptions) -> Vec<LinkEntry> {
    let doc = Html::parse_document(html);
    let blacklist: Vec<String> = opts.blacklist.iter().map(|b| fold_upper(b)).collect();
    let mut entries = Vec::new();

    for el in doc.select(&LINK_SEL) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };

        let text = visible_text(&el);
        if text.is_empty() {
            continue;
        }

        if is_blacklisted(&text, &blacklist) {
            debug!(%text, "blacklisted link skipped");
            continue;
        }

        if !href.ends_with(&opts.page_extension) || href.starts_with("mailto:") {
            continue;
        }

        match opts.base_url.join(href) {
            Ok(url) => entries.push(LinkEntry {
                title: text,
                url: url.to_string(),
            }),
            Err(e) => debug!(href, error = %e, "unresolvable link skipped"),
        }
    }

    entries
}

/// Whether the folded form of `text` contains any of the (folded) labels.
///
/// Substring match on the whole text: `INDEXATION` is caught by `INDEX`.
pub fn is_blacklisted(text: &str, folded_labels: &[String]) -> bool {
    let folded = fold_upper(text);
    folded_labels
        .iter()
        .any(|label| !label.is_empty() && folded.contains(label.as_str()))
}

/// Trimmed text fragments of an element joined by single spaces.
fn visible_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
