//! Stage 2 output: one combined document per group.
//!
//! Each group's page blobs are read in order and joined with a horizontal
//! rule. The written blobs are summarized in a group report persisted next to
//! the manifest.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use folio_shared::sanitize::group_file_name;
use folio_shared::{FolioError, Group, GroupArtifact, GroupReport, OutputLayout, Result};
use folio_storage::BlobStore;

use crate::pipeline::ProgressReporter;

/// Separator placed between consecutive pages of a group.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Join page texts with [`PAGE_SEPARATOR`] and trim the result.
///
/// The separator only goes between pages, so the document never opens with
/// a rule unless the first page is blank.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(PAGE_SEPARATOR)
        .trim()
        .to_string()
}

/// Assemble and persist every group, then write the group report.
///
/// Group `n` (1-based, in the given order) is written to
/// `<groups_dir>/<nn>_<name>.md`. A page blob that cannot be read aborts the
/// whole run with [`FolioError::Read`]; nothing is skipped.
#[instrument(skip_all, fields(groups = groups.len()))]
pub async fn assemble_groups(
    groups: &[Group],
    store: &dyn BlobStore,
    layout: &OutputLayout,
    progress: &dyn ProgressReporter,
) -> Result<Vec<GroupArtifact>> {
    let total = groups.len();
    let mut artifacts = Vec::with_capacity(total);

    for (i, group) in groups.iter().enumerate() {
        let mut pages = Vec::with_capacity(group.files.len());
        for file in &group.files {
            pages.push(store.read(&layout.page_key(file)).await?);
        }

        let content = join_pages(&pages);
        let file = group_file_name(i + 1, &group.name);
        store.write(&layout.group_key(&file), &content).await?;

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let sha256 = format!("{:x}", hasher.finalize());

        debug!(file = %file, pages = pages.len(), size = content.len(), "wrote group");
        progress.group_written(&group.name, i + 1, total);

        artifacts.push(GroupArtifact {
            name: group.name.clone(),
            file,
            page_count: pages.len(),
            sha256,
            size_bytes: content.len(),
        });
    }

    write_report(store, layout, &artifacts).await?;

    info!(count = artifacts.len(), "group assembly complete");
    Ok(artifacts)
}

/// Persist the group report under `layout.report_file`.
async fn write_report(
    store: &dyn BlobStore,
    layout: &OutputLayout,
    artifacts: &[GroupArtifact],
) -> Result<()> {
    let report = GroupReport {
        assembled_at: Utc::now(),
        groups: artifacts.to_vec(),
    };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| FolioError::parse(format!("failed to serialize group report: {e}")))?;
    store.write(&layout.report_file, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use folio_storage::FsBlobStore;

    fn temp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("folio-assemble-{}", uuid::Uuid::now_v7()))
    }

    fn group(name: &str, files: &[&str]) -> Group {
        Group {
            name: name.into(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn join_trims_and_separates() {
        assert_eq!(join_pages(&["A", "B"]), "A\n\n---\n\nB");
        assert_eq!(join_pages(&["  A\n", "B\n\n"]), "A\n\n\n---\n\nB");
        assert_eq!(join_pages(&["solo"]), "solo");
        assert_eq!(join_pages::<&str>(&[]), "");
    }

    #[test]
    fn empty_first_page_leaves_leading_rule() {
        assert_eq!(join_pages(&["", "B"]), "---\n\nB");
    }

    #[tokio::test]
    async fn assembles_groups_in_order() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();

        store.write("pages_markdown/001.md", "# Prologue\n").await.unwrap();
        store.write("pages_markdown/002.md", "# Je crois").await.unwrap();
        store.write("pages_markdown/003.md", "Suite\n\n").await.unwrap();

        let groups = vec![
            group("Prologue", &["001.md"]),
            group("Premiere Section \"Je Crois\" – \"Nous Croyons\"", &["002.md", "003.md"]),
        ];

        let artifacts = assemble_groups(&groups, &store, &layout, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].file, "01_prologue.md");
        assert_eq!(artifacts[1].file, "02_premiere_section_je_crois__nous_croyons.md");
        assert_eq!(artifacts[1].page_count, 2);
        assert_eq!(artifacts[0].sha256.len(), 64);

        let second = store.read(&layout.group_key(&artifacts[1].file)).await.unwrap();
        assert_eq!(second, "# Je crois\n\n---\n\nSuite");
        assert_eq!(artifacts[1].size_bytes, second.len());

        let report: GroupReport =
            serde_json::from_str(&store.read("groups_index.json").await.unwrap()).unwrap();
        assert_eq!(report.groups, artifacts);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_page_aborts_with_read_error() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        store.write("pages_markdown/001.md", "A").await.unwrap();

        let groups = vec![group("Prologue", &["001.md", "404.md"])];
        let err = assemble_groups(&groups, &store, &layout, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FolioError::Read { ref key, .. } if key == "pages_markdown/404.md"));
        assert!(!store.exists("groups_markdown/01_prologue.md").await.unwrap());
        assert!(!store.exists("groups_index.json").await.unwrap());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn same_content_same_checksum() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        store.write("pages_markdown/a.md", "Texte").await.unwrap();

        let groups = vec![group("Un", &["a.md"]), group("Deux", &["a.md"])];
        let artifacts = assemble_groups(&groups, &store, &layout, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(artifacts[0].sha256, artifacts[1].sha256);

        let _ = std::fs::remove_dir_all(&root);
    }
}
