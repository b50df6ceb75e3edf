//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use folio_core::pipeline::{self, ProgressReporter, RunSummary};
use folio_shared::{AppConfig, init_config, load_config, load_config_from, validate_api_key};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Folio: document archive → Markdown pages → section documents.
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Crawl an HTML document archive into Markdown and regroup it by section.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.folio/folio.toml).
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Stage 1: convert every indexed page to Markdown and write the manifest.
    Extract,

    /// Stage 2: group the manifest's pages by section and assemble them.
    Group,

    /// Run both stages.
    Run,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "folio=info",
        1 => "folio=debug",
        _ => "folio=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Extract => cmd_stage(config_path, Stage::Extract).await,
        Command::Group => cmd_stage(config_path, Stage::Group).await,
        Command::Run => cmd_stage(config_path, Stage::All).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

#[derive(Clone, Copy, Debug)]
enum Stage {
    Extract,
    Group,
    All,
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn cmd_stage(config_path: Option<&Path>, stage: Stage) -> Result<()> {
    let config = resolve_config(config_path)?;

    // Fail before any network traffic if the model can't be reached
    if !matches!(stage, Stage::Group) {
        validate_api_key(&config)?;
    }

    let store = folio_storage::open_store(&config.storage).await?;

    info!(
        ?stage,
        storage = store.name(),
        base_url = %config.source.base_url,
        "starting folio"
    );

    let reporter = CliProgress::new();
    let summary = match stage {
        Stage::Extract => pipeline::run_extraction(&config, store.as_ref(), &reporter).await?,
        Stage::Group => pipeline::run_grouping(&config, store.as_ref(), &reporter).await?,
        Stage::All => pipeline::run_all(&config, store.as_ref(), &reporter).await?,
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    if let Some(location) = &summary.manifest_location {
        println!("  Pages:    {} extracted of {} discovered", summary.pages_extracted, summary.pages_discovered);
        println!("  Manifest: {location}");
    }
    if let Some(location) = &summary.report_location {
        println!("  Groups:   {} assembled", summary.groups.len());
        for group in &summary.groups {
            println!("    {} ({} pages)", group.file, group.page_count);
        }
        println!("  Report:   {location}");
    }
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_converted(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Converting [{current}/{total}] {title}"));
    }

    fn page_skipped(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .println(format!("  skipped [{current}/{total}] {title}"));
    }

    fn group_written(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Assembling [{current}/{total}] {name}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
