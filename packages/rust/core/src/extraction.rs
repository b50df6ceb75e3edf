//! Stage 1: convert each discovered page and record the manifest.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use folio_crawler::{Fetcher, extract_body};
use folio_markdown::TextTransformer;
use folio_shared::sanitize::{page_file_name, page_stem};
use folio_shared::{FolioError, LinkEntry, Manifest, OutputLayout, PageRecord, Result};
use folio_storage::BlobStore;

use crate::manifest;
use crate::pipeline::ProgressReporter;

/// Collaborators and settings for the page conversion loop.
pub struct ExtractionContext<'a> {
    pub fetcher: &'a Fetcher,
    pub transformer: &'a dyn TextTransformer,
    pub store: &'a dyn BlobStore,
    pub layout: &'a OutputLayout,
    /// Pause after every page, whatever its outcome.
    pub page_delay: Duration,
}

/// Convert every link in order, persist each page blob and the manifest.
///
/// Pages are processed one at a time. A failure on one page (fetch,
/// transform or write) is logged and the page is left out of the manifest;
/// the loop moves on without retrying. Page file numbers follow the link's
/// position in `links`, so skipped pages leave gaps.
#[instrument(skip_all, fields(links = links.len()))]
pub async fn convert_and_record(
    links: &[LinkEntry],
    ctx: &ExtractionContext<'_>,
    progress: &dyn ProgressReporter,
) -> Result<Manifest> {
    let total = links.len();
    let mut manifest = Manifest::new();

    for (i, link) in links.iter().enumerate() {
        let seq = i + 1;

        match convert_page(link, seq, ctx).await {
            Ok(record) => {
                debug!(file = %record.file, "page recorded");
                progress.page_converted(&link.title, seq, total);
                manifest.push(record);
            }
            Err(e) => {
                warn!(title = %link.title, url = %link.url, error = %e, "page skipped");
                progress.page_skipped(&link.title, seq, total);
            }
        }

        if !ctx.page_delay.is_zero() {
            tokio::time::sleep(ctx.page_delay).await;
        }
    }

    manifest::save_manifest(ctx.store, ctx.layout, &manifest).await?;

    info!(
        recorded = manifest.len(),
        skipped = total - manifest.len(),
        "extraction complete"
    );
    Ok(manifest)
}

/// Fetch, transform and persist a single page.
async fn convert_page(
    link: &LinkEntry,
    seq: usize,
    ctx: &ExtractionContext<'_>,
) -> Result<PageRecord> {
    let url = Url::parse(&link.url)
        .map_err(|e| FolioError::validation(format!("invalid page URL '{}': {e}", link.url)))?;

    let html = ctx.fetcher.fetch_document(&url).await?;

    let text = match extract_body(&html) {
        Some(body) => ctx.transformer.transform(&body).await?,
        None => {
            debug!(url = %url, "document has no body, recording empty page");
            String::new()
        }
    };

    let file = page_file_name(seq, &link.title);
    ctx.store.write(&ctx.layout.page_key(&file), &text).await?;

    Ok(PageRecord {
        title: page_stem(&link.title),
        url: link.url.clone(),
        file,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::pipeline::SilentProgress;
    use async_trait::async_trait;
    use folio_crawler::FetchOptions;
    use folio_storage::FsBlobStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every body it receives and echoes a fixed reply.
    #[derive(Default)]
    struct RecordingTransformer {
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextTransformer for RecordingTransformer {
        async fn transform(&self, body_html: &str) -> Result<String> {
            let mut bodies = self.bodies.lock().unwrap();
            bodies.push(body_html.to_string());
            if body_html.contains("boom") {
                return Err(FolioError::Transform("model refused".into()));
            }
            Ok(format!("# Page {}", bodies.len()))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn temp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("folio-extract-{}", uuid::Uuid::now_v7()))
    }

    async fn mount_page(server: &MockServer, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn link(server: &MockServer, title: &str, route: &str) -> LinkEntry {
        LinkEntry {
            title: title.into(),
            url: format!("{}{route}", server.uri()),
        }
    }

    #[tokio::test]
    async fn failed_pages_are_skipped_and_numbering_keeps_position() {
        let server = MockServer::start().await;
        mount_page(&server, "/P1.HTM", 200, "<html><body><p>Un</p></body></html>").await;
        mount_page(&server, "/P2.HTM", 500, "oops").await;
        mount_page(&server, "/P3.HTM", 200, "<html><body><p>boom</p></body></html>").await;
        mount_page(&server, "/P4.HTM", 200, "<html><body><p>Quatre</p></body></html>").await;

        let links = vec![
            link(&server, "PROLOGUE", "/P1.HTM"),
            link(&server, "Deuxième", "/P2.HTM"),
            link(&server, "Troisième", "/P3.HTM"),
            link(&server, "PREMIÈRE SECTION « JE CROIS »", "/P4.HTM"),
        ];

        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: Duration::ZERO,
        };

        let manifest = convert_and_record(&links, &ctx, &SilentProgress).await.unwrap();

        let files: Vec<&str> = manifest.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, ["001_PROLOGUE.md", "004_PREMIERE_SECTION__JE_CROIS.md"]);
        assert_eq!(manifest.records()[1].title, "PREMIERE_SECTION__JE_CROIS");

        let first = store.read("pages_markdown/001_PROLOGUE.md").await.unwrap();
        assert_eq!(first, "# Page 1");
        assert!(!store.exists("pages_markdown/003_Troisieme.md").await.unwrap());

        let saved = manifest::load_manifest(&store, &layout).await.unwrap();
        assert_eq!(saved, manifest);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn bodiless_document_is_recorded_without_transform() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/FRAMES.HTM",
            200,
            r#"<html><frameset cols="20%,80%"><frame src="a.htm"></frameset></html>"#,
        )
        .await;

        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: Duration::ZERO,
        };

        let links = vec![link(&server, "Cadres", "/FRAMES.HTM")];
        let manifest = convert_and_record(&links, &ctx, &SilentProgress).await.unwrap();

        assert_eq!(manifest.len(), 1);
        assert!(transformer.bodies.lock().unwrap().is_empty());
        assert_eq!(store.read("pages_markdown/001_Cadres.md").await.unwrap(), "");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn transformer_receives_body_markup() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/P1.HTM",
            200,
            "<html><head><title>t</title></head><body><h1>PROLOGUE</h1></body></html>",
        )
        .await;

        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: Duration::ZERO,
        };

        convert_and_record(&[link(&server, "PROLOGUE", "/P1.HTM")], &ctx, &SilentProgress)
            .await
            .unwrap();

        let bodies = transformer.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].starts_with("<body>"));
        assert!(bodies[0].contains("<h1>PROLOGUE</h1>"));
        assert!(!bodies[0].contains("<title>"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn no_links_writes_empty_manifest() {
        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: Duration::ZERO,
        };

        let manifest = convert_and_record(&[], &ctx, &SilentProgress).await.unwrap();

        assert!(manifest.is_empty());
        assert_eq!(store.read("pages_index.json").await.unwrap(), "{}");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_follows_every_page_whatever_the_outcome() {
        // Both links fail before any network I/O, so the paused clock only
        // moves through the inter-page sleeps.
        let links = vec![
            LinkEntry {
                title: "Illisible".into(),
                url: "pas une url".into(),
            },
            LinkEntry {
                title: "Archive".into(),
                url: "ftp://example.com/P1.HTM".into(),
            },
        ];

        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: Duration::from_secs(2),
        };

        let start = tokio::time::Instant::now();
        let manifest = convert_and_record(&links, &ctx, &SilentProgress).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert!(manifest.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn delay_applies_after_failed_and_recorded_pages() {
        let server = MockServer::start().await;
        mount_page(&server, "/P1.HTM", 500, "oops").await;
        mount_page(&server, "/P2.HTM", 200, "<html><body><p>Deux</p></body></html>").await;

        let links = vec![
            link(&server, "Erreur", "/P1.HTM"),
            link(&server, "PROLOGUE", "/P2.HTM"),
        ];

        let root = temp_root();
        let store = FsBlobStore::new(&root);
        let layout = OutputLayout::default();
        let fetcher = Fetcher::new(&FetchOptions::default()).unwrap();
        let transformer = RecordingTransformer::default();
        let delay = Duration::from_millis(150);
        let ctx = ExtractionContext {
            fetcher: &fetcher,
            transformer: &transformer,
            store: &store,
            layout: &layout,
            page_delay: delay,
        };

        let start = std::time::Instant::now();
        let manifest = convert_and_record(&links, &ctx, &SilentProgress).await.unwrap();

        assert!(start.elapsed() >= delay * 2, "elapsed {:?}", start.elapsed());
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.records()[0].file, "002_PROLOGUE.md");

        let _ = std::fs::remove_dir_all(&root);
    }
}
