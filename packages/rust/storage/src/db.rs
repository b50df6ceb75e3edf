//! libSQL blob backend.
//!
//! Plays the role of the object store: every blob is a row in the `blobs`
//! table, keyed by its path.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use folio_shared::{FolioError, Result};
use libsql::{Connection, Database, params};
use tracing::debug;

use crate::{BlobStore, migrations, validate_key};

/// Blob store backed by a local libSQL database file.
pub struct LibsqlBlobStore {
    // `conn` is only valid while the database handle is alive.
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    label: String,
}

impl LibsqlBlobStore {
    /// Open or create a database at `path` and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| FolioError::io(dir, e))?;
        }

        let storage_err = |e: libsql::Error| FolioError::Storage(format!("{}: {e}", path.display()));
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let store = Self {
            db,
            conn,
            label: path.display().to_string(),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Apply every migration newer than the recorded schema version.
    async fn migrate(&self) -> Result<()> {
        let applied = self.applied_version().await;
        let pending = migrations::all_migrations()
            .into_iter()
            .filter(|m| m.version > applied);

        for migration in pending {
            debug!(
                version = migration.version,
                description = migration.description,
                store = %self.label,
                "migrating blob store"
            );
            self.conn.execute_batch(migration.sql).await.map_err(|e| {
                FolioError::Storage(format!("blob store migration v{} failed: {e}", migration.version))
            })?;
        }
        Ok(())
    }

    /// Highest applied migration, 0 for a fresh database.
    async fn applied_version(&self) -> u32 {
        let Ok(mut rows) = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await
        else {
            return 0;
        };

        match rows.next().await {
            Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
            _ => 0,
        }
    }
}

#[async_trait]
impl BlobStore for LibsqlBlobStore {
    async fn read(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        let mut rows = self
            .conn
            .query("SELECT content FROM blobs WHERE key = ?1", params![key])
            .await
            .map_err(|e| FolioError::read(key, e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map_err(|e| FolioError::read(key, e.to_string())),
            Ok(None) => Err(FolioError::read(key, format!("no blob in {}", self.label))),
            Err(e) => Err(FolioError::read(key, e.to_string())),
        }
    }

    async fn write(&self, key: &str, content: &str) -> Result<()> {
        validate_key(key)?;
        let now = Utc::now().to_rfc3339();
        let size = i64::try_from(content.len()).unwrap_or(i64::MAX);
        self.conn
            .execute(
                "INSERT INTO blobs (key, content, size_bytes, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                   content = excluded.content,
                   size_bytes = excluded.size_bytes,
                   updated_at = excluded.updated_at",
                params![key, content, size, now.as_str()],
            )
            .await
            .map_err(|e| FolioError::write(key, e.to_string()))?;

        debug!(key, size = content.len(), "wrote blob row");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut rows = self
            .conn
            .query("SELECT 1 FROM blobs WHERE key = ?1", params![key])
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(FolioError::Storage(e.to_string())),
        }
    }

    fn location(&self, key: &str) -> String {
        format!("{}#{key}", self.label)
    }

    fn name(&self) -> &str {
        "libsql"
    }
}
