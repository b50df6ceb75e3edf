//! Index-page link discovery.
//!
//! Before any page is converted, Folio fetches the site's index document and
//! collects the outbound page links in document order. Navigation and meta
//! links are filtered out by a substring blacklist on the folded link text.

mod links;

use folio_crawler::Fetcher;
use folio_shared::{LinkEntry, Result, SourceConfig};
use tracing::{info, instrument};
use url::Url;

pub use links::{extract_links, is_blacklisted};

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Index document listing the pages.
    pub index_url: Url,
    /// Base every link target is resolved against.
    pub base_url: Url,
    /// Required suffix of page link targets.
    pub page_extension: String,
    /// Labels that disqualify a link (matched against folded link text).
    pub blacklist: Vec<String>,
}

impl DiscoveryOptions {
    /// Build options from the `[source]` config section.
    pub fn from_source(source: &SourceConfig) -> Result<Self> {
        Ok(Self {
            index_url: source.index_url()?,
            base_url: source.base()?,
            page_extension: source.page_extension.clone(),
            blacklist: source.blacklist.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch the index document and return its page links in document order.
///
/// A fetch failure is returned as-is: without the index no page can be
/// discovered, so callers abort the run.
#[instrument(skip_all, fields(index_url = %opts.index_url))]
pub async fn discover_links(fetcher: &Fetcher, opts: &DiscoveryOptions) -> Result<Vec<LinkEntry>> {
    info!("fetching index document");

    let html = fetcher.fetch_document(&opts.index_url).await?;
    let entries = extract_links(&html, opts);

    info!(links = entries.len(), "index links discovered");
    Ok(entries)
}
