//! Filesystem blob backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use folio_shared::{FolioError, Result};
use tracing::debug;

use crate::{BlobStore, validate_key};

/// Stores each blob as a UTF-8 file at `<root>/<key>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Directories are created lazily on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, key: &str) -> Result<String> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FolioError::read(key, format!("no blob at {}", path.display())))
            }
            Err(e) => Err(FolioError::read(key, e.to_string())),
        }
    }

    async fn write(&self, key: &str, content: &str) -> Result<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FolioError::io(parent, e))?;
        }

        // Write to a sibling temp file, then rename over the target
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| FolioError::write(key, e.to_string()))?;
        tokio::fs::rename(&temp, &path)
            .await
            .map_err(|e| FolioError::write(key, e.to_string()))?;

        debug!(path = %path.display(), size = content.len(), "wrote blob");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| FolioError::io(path, e))
    }

    fn location(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }

    fn name(&self) -> &str {
        "fs"
    }
}
