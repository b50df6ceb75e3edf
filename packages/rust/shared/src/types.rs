//! Core domain types shared by both pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LinkEntry
// ---------------------------------------------------------------------------

/// A candidate page link discovered on the index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Visible link text (never empty, never blacklisted).
    pub title: String,
    /// Absolute page URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// PageRecord / Manifest
// ---------------------------------------------------------------------------

/// One successfully converted page, as recorded in the manifest.
///
/// Serialized with the French field names of the established manifest format
/// (`titre`, `url`, `fichier`) so existing indexes stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Sanitized page title.
    #[serde(rename = "titre")]
    pub title: String,
    /// Source page URL.
    pub url: String,
    /// Name of the persisted page blob inside the pages directory.
    #[serde(rename = "fichier")]
    pub file: String,
}

/// Ordered record of converted pages bridging extraction and grouping.
///
/// Append-only; iteration order is discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<PageRecord>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the end.
    pub fn push(&mut self, record: PageRecord) {
        self.records.push(record);
    }

    /// Number of recorded pages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no page has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in manifest order.
    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    /// Iterate records in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.records.iter()
    }
}

impl From<Vec<PageRecord>> for Manifest {
    fn from(records: Vec<PageRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<PageRecord> for Manifest {
    fn from_iter<I: IntoIterator<Item = PageRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a PageRecord;
    type IntoIter = std::slice::Iter<'a, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// An ordered set of page files assembled into one combined document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Display name (title-cased section header).
    pub name: String,
    /// Page blob names in manifest order.
    pub files: Vec<String>,
}

/// Metadata for one written group blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupArtifact {
    /// Group display name.
    pub name: String,
    /// Name of the group blob inside the groups directory.
    pub file: String,
    /// Number of pages concatenated into the blob.
    pub page_count: usize,
    /// SHA-256 of the written content (hex).
    pub sha256: String,
    /// Size of the written content in bytes.
    pub size_bytes: usize,
}

/// The group report persisted after stage 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    /// When assembly finished.
    pub assembled_at: DateTime<Utc>,
    /// Written groups in output order.
    pub groups: Vec<GroupArtifact>,
}
