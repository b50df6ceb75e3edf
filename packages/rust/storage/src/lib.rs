//! Named text-blob storage.
//!
//! Both pipeline stages persist and read plain text through the [`BlobStore`]
//! capability. Keys are `/`-separated relative paths such as
//! `pages_markdown/001_Prologue.md`. Two interchangeable backends exist:
//!
//! - [`FsBlobStore`]: one file per key under a root directory
//! - [`LibsqlBlobStore`]: one row per key in a libSQL database file
//!
//! The backend is chosen from configuration via [`open_store`].

mod db;
mod fs;
mod migrations;

use async_trait::async_trait;
use folio_shared::{FolioError, Result, StorageBackend, StorageConfig};
use tracing::info;

pub use db::LibsqlBlobStore;
pub use fs::FsBlobStore;

/// Capability to persist and read named text blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// Fails with [`FolioError::Read`] when the blob does not exist.
    async fn read(&self, key: &str) -> Result<String>;

    /// Create or overwrite the blob stored under `key`.
    async fn write(&self, key: &str, content: &str) -> Result<()>;

    /// Whether a blob is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Human-readable location of `key`, for logs and summaries.
    fn location(&self, key: &str) -> String;

    /// Backend name for tracing.
    fn name(&self) -> &str;
}

/// Open the backend selected in `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Box<dyn BlobStore>> {
    let store: Box<dyn BlobStore> = match config.backend {
        StorageBackend::Fs => Box::new(FsBlobStore::new(&config.root)),
        StorageBackend::Libsql => {
            Box::new(LibsqlBlobStore::open(std::path::Path::new(&config.database)).await?)
        }
    };
    info!(backend = store.name(), "blob store ready");
    Ok(store)
}

/// Reject keys that could escape the store root.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.split(['/', '\\']).any(|seg| seg == "..")
    {
        return Err(FolioError::validation(format!("invalid blob key: '{key}'")));
    }
    Ok(())
}
