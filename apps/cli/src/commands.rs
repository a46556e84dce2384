//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use manualpress_automation::ChromePage;
use manualpress_core::pipeline::{HarvestJob, HarvestResult, ProgressReporter};
use manualpress_core::render::{DocumentRenderer, MarkdownRenderer};
use manualpress_shared::{AppConfig, HarvestConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ManualPress — flatten a browser-rendered owner's manual into one document.
#[derive(Parser)]
#[command(
    name = "manualpress",
    version,
    about = "Harvest a JavaScript-rendered owner's manual into a single Markdown document.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Harvest a manual and render it as Markdown.
    Harvest {
        /// Root URL of the manual.
        url: String,

        /// Manual title used in the rendered document (defaults to the URL hostname).
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<String>,

        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,

        /// Stop after this many accepted sections.
        #[arg(long)]
        cap: Option<usize>,

        /// Maximum seconds to wait for a section's content to settle.
        #[arg(long)]
        settle: Option<f64>,

        /// Seconds to wait before each image read.
        #[arg(long)]
        image_settle: Option<f64>,
    },

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
        0 => "manualpress=info",
        1 => "manualpress=debug",
        _ => "manualpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Harvest {
            url,
            name,
            out,
            headed,
            cap,
            settle,
            image_settle,
        } => {
            cmd_harvest(
                &url,
                name.as_deref(),
                out.as_deref(),
                headed,
                cap,
                settle,
                image_settle,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn cmd_harvest(
    url: &str,
    name: Option<&str>,
    out: Option<&str>,
    headed: bool,
    cap: Option<usize>,
    settle: Option<f64>,
    image_settle: Option<f64>,
) -> Result<()> {
    let config = load_config()?;

    let parsed_url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let title = name.map(String::from).unwrap_or_else(|| {
        parsed_url.host_str().unwrap_or("manual").to_string()
    });

    let output_dir = match out {
        Some(p) => expand_tilde(p),
        None => expand_tilde(&config.defaults.output_dir).join(slugify(&title)),
    };

    // CLI flags override config file values.
    let mut harvest_config = HarvestConfig::from(&config);
    if headed {
        harvest_config.headless = false;
    }
    if let Some(cap) = cap {
        harvest_config.debug_cap = Some(cap);
    }
    if let Some(secs) = settle {
        harvest_config.settle_max_wait = std::time::Duration::from_secs_f64(secs);
    }
    if let Some(secs) = image_settle {
        harvest_config.image_settle = std::time::Duration::from_secs_f64(secs);
    }

    let job = HarvestJob {
        url: parsed_url,
        title: title.clone(),
        output_dir: output_dir.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        config: harvest_config,
    };

    info!(url, name = %title, out = %output_dir.display(), "harvesting manual");

    let reporter = CliProgress::new();

    let page = ChromePage::launch(job.config.headless).await?;
    let harvested = manualpress_core::pipeline::harvest(&job, &page, &reporter).await;
    page.close().await?;
    let result = harvested?;

    let out_path = output_dir.join("manual.md");
    let rendered = MarkdownRenderer::new(&out_path).render(&title, &result.document)?;

    println!();
    println!("  Manual harvested!");
    println!("  Run:        {}", result.summary.run_id);
    println!("  Sections:   {}", result.summary.sections_accepted);
    println!("  Duplicates: {}", result.summary.duplicates_skipped);
    println!("  Failed:     {}", result.summary.entries_failed);
    println!("  Images:     {}", result.summary.images_persisted);
    println!("  Document:   {}", rendered.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    if !result.storage_errors.is_empty() {
        println!("  {} section(s) kept text only after image storage errors:", result.storage_errors.len());
        for (section, error) in &result.storage_errors {
            println!("    {section}: {error}");
        }
        println!();
    }

    Ok(())
}

/// Expand a leading `~/` against the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Lowercase, alphanumeric-and-dash directory name from a manual title.
fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let collapsed: Vec<&str> = slug.split('-').filter(|s| !s.is_empty()).collect();
    if collapsed.is_empty() {
        "manual".to_string()
    } else {
        collapsed.join("-")
    }
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
                .unwrap()
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

    fn section_accepted(&self, title: &str, accepted: usize, total: usize) {
        self.spinner.set_message(format!(
            "Harvesting [{accepted}/{total}] {title}"
        ));
    }

    fn entry_skipped(&self, title: &str, reason: &str) {
        self.spinner.set_message(format!("Skipped ({reason}) {title}"));
    }

    fn done(&self, _result: &HarvestResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
