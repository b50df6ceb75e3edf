//! End-to-end stage drivers: config → collaborators → stage → summary.

use std::time::{Duration, Instant};

use tracing::{info, instrument};

use folio_crawler::{FetchOptions, Fetcher};
use folio_discovery::{DiscoveryOptions, discover_links};
use folio_markdown::build_transformer;
use folio_shared::{AppConfig, GroupArtifact, Result};
use folio_storage::BlobStore;

use crate::assembler::assemble_groups;
use crate::extraction::{ExtractionContext, convert_and_record};
use crate::grouping::group_pages;
use crate::manifest::load_manifest;

/// Outcome of one or both stages.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Links found on the index document (extraction only).
    pub pages_discovered: usize,
    /// Pages recorded in the manifest (extraction only).
    pub pages_extracted: usize,
    /// Group blobs written (grouping only).
    pub groups: Vec<GroupArtifact>,
    /// Where the manifest lives.
    pub manifest_location: Option<String>,
    /// Where the group report lives.
    pub report_location: Option<String>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page has been converted and recorded.
    fn page_converted(&self, title: &str, current: usize, total: usize);
    /// Called when a page failed and was left out of the manifest.
    fn page_skipped(&self, title: &str, current: usize, total: usize);
    /// Called when a group blob has been written.
    fn group_written(&self, name: &str, current: usize, total: usize);
    /// Called once when the requested stages complete.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_converted(&self, _title: &str, _current: usize, _total: usize) {}
    fn page_skipped(&self, _title: &str, _current: usize, _total: usize) {}
    fn group_written(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Stage 1: discover the index links, convert every page, write the manifest.
pub async fn run_extraction(
    config: &AppConfig,
    store: &dyn BlobStore,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    extraction_stage(config, store, progress, &mut summary).await?;

    summary.elapsed = start.elapsed();
    progress.done(&summary);
    Ok(summary)
}

/// Stage 2: read the manifest, group its pages, write one blob per group.
pub async fn run_grouping(
    config: &AppConfig,
    store: &dyn BlobStore,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    grouping_stage(config, store, progress, &mut summary).await?;

    summary.elapsed = start.elapsed();
    progress.done(&summary);
    Ok(summary)
}

/// Both stages back to back.
pub async fn run_all(
    config: &AppConfig,
    store: &dyn BlobStore,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    extraction_stage(config, store, progress, &mut summary).await?;
    grouping_stage(config, store, progress, &mut summary).await?;

    summary.elapsed = start.elapsed();
    progress.done(&summary);
    Ok(summary)
}

#[instrument(skip_all, fields(base_url = %config.source.base_url, store = store.name()))]
async fn extraction_stage(
    config: &AppConfig,
    store: &dyn BlobStore,
    progress: &dyn ProgressReporter,
    summary: &mut RunSummary,
) -> Result<()> {
    let fetcher = Fetcher::new(&FetchOptions {
        timeout_secs: config.crawl.request_timeout_secs,
    })?;
    let opts = DiscoveryOptions::from_source(&config.source)?;
    let transformer = build_transformer(&config.transform, Some(&opts.base_url))?;

    progress.phase("Discovering pages");
    let links = discover_links(&fetcher, &opts).await?;
    summary.pages_discovered = links.len();

    info!(
        links = links.len(),
        transformer = transformer.name(),
        "starting page conversion"
    );

    progress.phase("Converting pages");
    let ctx = ExtractionContext {
        fetcher: &fetcher,
        transformer: transformer.as_ref(),
        store,
        layout: &config.output,
        page_delay: Duration::from_millis(config.crawl.page_delay_ms),
    };
    let manifest = convert_and_record(&links, &ctx, progress).await?;

    summary.pages_extracted = manifest.len();
    summary.manifest_location = Some(store.location(&config.output.manifest_file));
    Ok(())
}

#[instrument(skip_all, fields(store = store.name()))]
async fn grouping_stage(
    config: &AppConfig,
    store: &dyn BlobStore,
    progress: &dyn ProgressReporter,
    summary: &mut RunSummary,
) -> Result<()> {
    progress.phase("Grouping pages");
    let manifest = load_manifest(store, &config.output).await?;
    let groups = group_pages(&manifest, &config.grouping)?;

    info!(pages = manifest.len(), groups = groups.len(), "assembling groups");

    progress.phase("Assembling groups");
    summary.groups = assemble_groups(&groups, store, &config.output, progress).await?;
    summary.report_location = Some(store.location(&config.output.report_file));
    Ok(())
}
