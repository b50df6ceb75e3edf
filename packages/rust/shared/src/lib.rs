//! Shared types, error model, and configuration for Folio.
//!
//! This crate is the foundation depended on by all other Folio crates.
//! It provides:
//! - [`FolioError`]: the unified error type
//! - Domain types ([`LinkEntry`], [`PageRecord`], [`Manifest`], [`Group`])
//! - Configuration ([`AppConfig`], config loading)
//! - Filename sanitizing for stage-1 pages and stage-2 groups ([`sanitize`])

pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlSettings, GroupingSchema, OutputLayout, PREFIX_STRATEGY, SourceConfig,
    StorageBackend, StorageConfig, TransformBackend, TransformConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{FolioError, Result};
pub use types::{Group, GroupArtifact, GroupReport, LinkEntry, Manifest, PageRecord};
