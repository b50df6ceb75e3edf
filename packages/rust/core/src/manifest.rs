//! Manifest encoding and persistence.
//!
//! The manifest is written as a JSON object keyed by position
//! (`{"0": {...}, "1": {...}}`). Keys are sorted numerically on read, so
//! `"10"` follows `"9"`. A plain JSON array of records is accepted as well.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, instrument};

use folio_shared::{FolioError, Manifest, OutputLayout, PageRecord, Result};
use folio_storage::BlobStore;

/// Serialize a manifest to its persisted JSON form.
pub fn encode_manifest(manifest: &Manifest) -> Result<String> {
    let keyed: BTreeMap<usize, &PageRecord> = manifest.iter().enumerate().collect();
    serde_json::to_string_pretty(&keyed)
        .map_err(|e| FolioError::parse(format!("failed to serialize manifest: {e}")))
}

/// Parse a persisted manifest, restoring write order.
pub fn decode_manifest(json: &str) -> Result<Manifest> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| FolioError::parse(format!("manifest is not valid JSON: {e}")))?;

    match value {
        Value::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, raw) in map {
                let position: usize = key.parse().map_err(|_| {
                    FolioError::validation(format!("manifest key '{key}' is not a position"))
                })?;
                entries.push((position, record_from_value(raw)?));
            }
            entries.sort_by_key(|(position, _)| *position);
            Ok(entries.into_iter().map(|(_, record)| record).collect())
        }
        Value::Array(items) => items.into_iter().map(record_from_value).collect(),
        other => Err(FolioError::validation(format!(
            "manifest must be an object or an array, got {}",
            json_kind(&other)
        ))),
    }
}

fn record_from_value(raw: Value) -> Result<PageRecord> {
    serde_json::from_value(raw)
        .map_err(|e| FolioError::validation(format!("invalid manifest record: {e}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write the manifest under `layout.manifest_file`.
#[instrument(skip_all, fields(records = manifest.len()))]
pub async fn save_manifest(
    store: &dyn BlobStore,
    layout: &OutputLayout,
    manifest: &Manifest,
) -> Result<()> {
    let json = encode_manifest(manifest)?;
    store.write(&layout.manifest_file, &json).await?;
    debug!(location = %store.location(&layout.manifest_file), "manifest written");
    Ok(())
}

/// Read the manifest written by the extraction stage.
///
/// A missing manifest is a [`FolioError::Read`].
pub async fn load_manifest(store: &dyn BlobStore, layout: &OutputLayout) -> Result<Manifest> {
    let json = store.read(&layout.manifest_file).await?;
    decode_manifest(&json)
}
