//! Application configuration for Folio.
//!
//! User config lives at `~/.folio/folio.toml`; `--config <path>` overrides the
//! location. CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FolioError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "folio.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".folio";

/// The only grouping strategy currently implemented.
pub const PREFIX_STRATEGY: &str = "prefix";

// ---------------------------------------------------------------------------
// Config structs (matching folio.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site to crawl and link filtering rules.
    #[serde(default)]
    pub source: SourceConfig,

    /// Per-page pacing and HTTP timeouts.
    #[serde(default)]
    pub crawl: CrawlSettings,

    /// Text-transform service settings.
    #[serde(default)]
    pub transform: TransformConfig,

    /// Blob storage backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Names of the persisted blobs.
    #[serde(default)]
    pub output: OutputLayout,

    /// Stage-2 grouping schema.
    #[serde(default)]
    pub grouping: GroupingSchema,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL every relative link is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Index document, relative to `base_url`.
    #[serde(default = "default_index_page")]
    pub index_page: String,

    /// Required suffix of page link targets (case-sensitive).
    #[serde(default = "default_page_extension")]
    pub page_extension: String,

    /// Navigation/meta labels; a link whose folded text contains one is skipped.
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_page: default_index_page(),
            page_extension: default_page_extension(),
            blacklist: default_blacklist(),
        }
    }
}

impl SourceConfig {
    /// Parsed base URL.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| FolioError::config(format!("invalid base_url '{}': {e}", self.base_url)))
    }

    /// Absolute URL of the index document.
    pub fn index_url(&self) -> Result<Url> {
        self.base()?.join(&self.index_page).map_err(|e| {
            FolioError::config(format!("invalid index_page '{}': {e}", self.index_page))
        })
    }
}

fn default_base_url() -> String {
    "https://www.vatican.va/archive/FRA0013/".into()
}
fn default_index_page() -> String {
    "_INDEX.HTM".into()
}
fn default_page_extension() -> String {
    ".HTM".into()
}
fn default_blacklist() -> Vec<String> {
    [
        "AIDE",
        "INDEX",
        "TABLE",
        "SOMMAIRE",
        "INTRODUCTION",
        "LIENS UTILES",
        "EN GENERAL",
        "LISTE DES SIGLES",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Fixed pause after every page, success or failure.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Timeout for a single document fetch.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_page_delay() -> u64 {
    2_000
}
fn default_request_timeout() -> u64 {
    30
}

/// Which text-transform implementation converts page bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformBackend {
    /// Mistral chat-completions API.
    Mistral,
    /// Offline HTML → Markdown conversion.
    Local,
}

/// `[transform]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_transform_backend")]
    pub backend: TransformBackend,

    /// Model identifier sent to the API.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (the chat-completions path is appended).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub random_seed: u64,

    /// Timeout for a single completion request.
    #[serde(default = "default_transform_timeout")]
    pub timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            backend: default_transform_backend(),
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            random_seed: 0,
            timeout_secs: default_transform_timeout(),
        }
    }
}

fn default_transform_backend() -> TransformBackend {
    TransformBackend::Mistral
}
fn default_model() -> String {
    "mistral-large-latest".into()
}
fn default_api_base() -> String {
    "https://api.mistral.ai".into()
}
fn default_api_key_env() -> String {
    "MISTRAL_API_KEY".into()
}
fn default_transform_timeout() -> u64 {
    120
}

/// Where blobs are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Plain files under `root`.
    Fs,
    /// A libSQL database file at `database`.
    Libsql,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend.
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Database file for the libSQL backend.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            root: default_storage_root(),
            database: default_database(),
        }
    }
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Fs
}
fn default_storage_root() -> String {
    "./dataset/folio_pipeline".into()
}
fn default_database() -> String {
    "./dataset/folio_pipeline/folio.db".into()
}

/// `[output]` section: blob keys relative to the store root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLayout {
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    #[serde(default = "default_groups_dir")]
    pub groups_dir: String,

    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            groups_dir: default_groups_dir(),
            manifest_file: default_manifest_file(),
            report_file: default_report_file(),
        }
    }
}

impl OutputLayout {
    /// Store key of a page blob.
    pub fn page_key(&self, file: &str) -> String {
        format!("{}/{file}", self.pages_dir)
    }

    /// Store key of a group blob.
    pub fn group_key(&self, file: &str) -> String {
        format!("{}/{file}", self.groups_dir)
    }
}

fn default_pages_dir() -> String {
    "pages_markdown".into()
}
fn default_groups_dir() -> String {
    "groups_markdown".into()
}
fn default_manifest_file() -> String {
    "pages_index.json".into()
}
fn default_report_file() -> String {
    "groups_index.json".into()
}

/// `[grouping]` section: strategy plus the ordered section table.
///
/// Table order is both the match priority and the output numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingSchema {
    /// Strategy name; only [`PREFIX_STRATEGY`] is implemented.
    #[serde(rename = "type", default = "default_grouping_type")]
    pub kind: String,

    /// Canonical section headers.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

impl Default for GroupingSchema {
    fn default() -> Self {
        Self {
            kind: default_grouping_type(),
            sections: default_sections(),
        }
    }
}

impl GroupingSchema {
    /// Build a prefix schema from a section table.
    pub fn prefix<S: Into<String>>(sections: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind: PREFIX_STRATEGY.into(),
            sections: sections.into_iter().map(Into::into).collect(),
        }
    }
}

fn default_grouping_type() -> String {
    PREFIX_STRATEGY.into()
}
fn default_sections() -> Vec<String> {
    [
        "PROLOGUE",
        "PREMIERE SECTION \"JE CROIS\" – \"NOUS CROYONS\"",
        "DEUXIEME PARTIE LA CELEBRATION DU MYSTERE CHRETIEN",
        "TROISIEME PARTIE LA VIE DANS LE CHRIST",
        "PREMIERE SECTION LA PRIERE DANS LA VIE CHRETIENNE",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.folio/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| FolioError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.folio/folio.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| FolioError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FolioError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FolioError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FolioError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty.
///
/// Only meaningful for the Mistral backend; the local backend needs no key.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    if config.transform.backend == TransformBackend::Local {
        return Ok(());
    }
    let var_name = &config.transform.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(FolioError::config(format!(
            "Mistral API key not found. Set the {var_name} environment variable."
        ))),
    }
}
