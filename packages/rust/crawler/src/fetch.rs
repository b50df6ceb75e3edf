//! HTTP document fetcher.

use std::time::Duration;

use folio_shared::{FolioError, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("Folio/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for a single request in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Fetches raw HTML documents over HTTP.
///
/// Bodies are always decoded as UTF-8 (lossy), whatever the server announces.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| FolioError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its body as text.
    ///
    /// Fails with [`FolioError::Fetch`] on network errors, non-2xx statuses or
    /// non-HTTP schemes.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_document(&self, url: &Url) -> Result<String> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FolioError::Fetch(format!("{url}: unsupported scheme")));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FolioError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FolioError::Fetch(format!("{url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FolioError::Fetch(format!("{url}: body read failed: {e}")))?;

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(len = body.len(), "document fetched");
        Ok(body)
    }
}
