//! Mistral chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use folio_shared::{FolioError, Result, TransformConfig};

use crate::TextTransformer;

/// Instruction sent with every page; `{html}` is replaced by the body.
pub const PROMPT_TEMPLATE: &str = "Tu es un assistant qui convertit le contenu HTML en Markdown structuré et lisible.
Garde les titres, paragraphes, citations, numérotations, et ignore les éléments de navigation.
Voici le HTML à traiter :

{html}

Réponds uniquement avec le contenu converti en Markdown.";

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Fill the prompt template with a page body.
pub fn build_prompt(body_html: &str) -> String {
    PROMPT_TEMPLATE.replace("{html}", body_html)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    random_seed: u64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Converts page bodies by asking a Mistral model.
pub struct MistralTransformer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    random_seed: u64,
}

impl MistralTransformer {
    /// Create a client, reading the API key from the env var named in config.
    pub fn new(config: &TransformConfig) -> Result<Self> {
        let var_name = &config.api_key_env;
        let api_key = match std::env::var(var_name) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                return Err(FolioError::config(format!(
                    "Mistral API key not found. Set the {var_name} environment variable."
                )));
            }
        };
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(config: &TransformConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FolioError::Transform(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{COMPLETIONS_PATH}", config.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            random_seed: config.random_seed,
        })
    }
}

#[async_trait]
impl TextTransformer for MistralTransformer {
    #[instrument(skip_all, fields(model = %self.model, html_len = body_html.len()))]
    async fn transform(&self, body_html: &str) -> Result<String> {
        let prompt = build_prompt(body_html);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: self.temperature,
            random_seed: self.random_seed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FolioError::Transform(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(FolioError::Transform(format!(
                "completion returned HTTP {status}: {snippet}"
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| FolioError::Transform(format!("invalid completion response: {e}")))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FolioError::Transform("completion response has no content".into()))?;

        let markdown = unwrap_markdown_fence(&content);
        debug!(md_len = markdown.len(), "completion received");
        Ok(markdown)
    }

    fn name(&self) -> &str {
        "mistral"
    }
}

/// Trim a model reply and drop a single fence wrapping the whole answer.
///
/// Replies such as ```` ```markdown\n# Titre\n``` ```` become `# Titre`.
/// Fences inside the answer are left alone.
pub fn unwrap_markdown_fence(reply: &str) -> String {
    let trimmed = reply.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed.to_string();
    };
    let Some((info, body)) = inner.split_once('\n') else {
        return trimmed.to_string();
    };

    let info = info.trim();
    if !matches!(info, "" | "markdown" | "md") || body.contains("```") {
        return trimmed.to_string();
    }

    body.trim().to_string()
}
