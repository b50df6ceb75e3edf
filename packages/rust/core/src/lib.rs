//! Core pipeline logic for Folio.
//!
//! Stage 1 (extraction) turns the index's page links into Markdown blobs and a
//! manifest. Stage 2 (grouping) folds the manifest into sections and assembles
//! one combined document per section.

pub mod assembler;
pub mod extraction;
pub mod grouping;
pub mod manifest;
pub mod pipeline;
