//! Offline HTML → Markdown conversion.

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use folio_shared::{FolioError, Result};

use crate::{TextTransformer, cleanup};

/// Deterministic converter built on `htmd`; needs no network access.
pub struct LocalTransformer {
    base_url: Option<Url>,
}

impl LocalTransformer {
    pub fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }

    fn convert(&self, body_html: &str) -> Result<String> {
        let converter = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg", "frame"])
            .build();

        let raw_markdown = converter
            .convert(body_html)
            .map_err(|e| FolioError::Transform(format!("htmd conversion failed: {e}")))?;

        debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

        Ok(cleanup::run_pipeline(&raw_markdown, self.base_url.as_ref()))
    }
}

#[async_trait]
impl TextTransformer for LocalTransformer {
    #[instrument(skip_all, fields(html_len = body_html.len()))]
    async fn transform(&self, body_html: &str) -> Result<String> {
        self.convert(body_html)
    }

    fn name(&self) -> &str {
        "local"
    }
}
