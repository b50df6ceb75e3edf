//! Page body → structured Markdown.
//!
//! The extraction stage only needs "give me Markdown for this `<body>`", so the
//! conversion sits behind [`TextTransformer`]. Two implementations exist:
//!
//! - [`MistralTransformer`]: the Mistral chat-completions API, deterministic
//!   sampling (temperature 0, fixed seed).
//! - [`LocalTransformer`]: offline conversion with `htmd` followed by the
//!   cleanup passes in `cleanup`.

mod cleanup;
mod local;
mod mistral;

use async_trait::async_trait;
use url::Url;

use folio_shared::{Result, TransformBackend, TransformConfig};

pub use local::LocalTransformer;
pub use mistral::{MistralTransformer, PROMPT_TEMPLATE, build_prompt, unwrap_markdown_fence};

/// Converts the HTML of a page body into Markdown.
#[async_trait]
pub trait TextTransformer: Send + Sync {
    /// Transform `body_html`; the returned text is trimmed.
    async fn transform(&self, body_html: &str) -> Result<String>;

    /// Short backend name used in logs.
    fn name(&self) -> &str;
}

/// Build the transformer selected by `[transform] backend`.
///
/// `base_url` is used by the local backend to absolutize relative links.
pub fn build_transformer(
    config: &TransformConfig,
    base_url: Option<&Url>,
) -> Result<Box<dyn TextTransformer>> {
    let transformer: Box<dyn TextTransformer> = match config.backend {
        TransformBackend::Mistral => Box::new(MistralTransformer::new(config)?),
        TransformBackend::Local => Box::new(LocalTransformer::new(base_url.cloned())),
    };
    tracing::debug!(backend = transformer.name(), "text transformer ready");
    Ok(transformer)
}
