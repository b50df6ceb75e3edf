//! Folio CLI: crawl a document archive into Markdown and regroup it by section.
//!
//! `folio extract` converts every page linked from the index into Markdown and
//! records a manifest; `folio group` folds the manifest into sections and
//! writes one combined document per section.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
