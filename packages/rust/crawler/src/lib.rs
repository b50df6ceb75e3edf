//! Document fetching and content-region extraction.
//!
//! This crate provides:
//! - [`Fetcher`]: sequential HTTP fetcher returning raw HTML documents
//! - [`extract_body`]: selects the primary content region of a page

mod content;
mod fetch;

pub use content::extract_body;
pub use fetch::{FetchOptions, Fetcher};
