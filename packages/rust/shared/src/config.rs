//! Application configuration for ManualPress.
//!
//! User config lives at `~/.manualpress/manualpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ManualPressError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "manualpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".manualpress";

// ---------------------------------------------------------------------------
// Config structs (matching manualpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// DOM selectors assumed at the manual site.
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory for harvested manuals.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Run the browser without a visible UI.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Cap on accepted sections; absent means no cap.
    #[serde(default)]
    pub debug_cap: Option<usize>,

    /// Interval between frame reads while waiting for content to settle.
    #[serde(default = "default_settle_poll_ms")]
    pub settle_poll_ms: u64,

    /// Maximum wait for frame content to settle after a click.
    #[serde(default = "default_settle_max_wait_secs")]
    pub settle_max_wait_secs: f64,

    /// Fixed delay before each image carrier read.
    #[serde(default = "default_image_settle_secs")]
    pub image_settle_secs: f64,

    /// Maximum wait for the navigation container on the root page.
    #[serde(default = "default_nav_wait_secs")]
    pub nav_wait_secs: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            headless: true,
            debug_cap: None,
            settle_poll_ms: default_settle_poll_ms(),
            settle_max_wait_secs: default_settle_max_wait_secs(),
            image_settle_secs: default_image_settle_secs(),
            nav_wait_secs: default_nav_wait_secs(),
        }
    }
}

fn default_output_dir() -> String {
    "~/manualpress-out".into()
}
fn default_true() -> bool {
    true
}
fn default_settle_poll_ms() -> u64 {
    250
}
fn default_settle_max_wait_secs() -> f64 {
    8.0
}
fn default_image_settle_secs() -> f64 {
    0.5
}
fn default_nav_wait_secs() -> f64 {
    20.0
}

/// `[selectors]` section — the DOM contract assumed at the root URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Navigation container holding the clickable table of contents.
    #[serde(default = "default_nav_container")]
    pub nav_container: String,

    /// Embedded sub-document carrying the section body.
    #[serde(default = "default_frame")]
    pub frame: String,

    /// Image carrier elements within the frame body.
    #[serde(default = "default_image_carriers")]
    pub image_carriers: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            nav_container: default_nav_container(),
            frame: default_frame(),
            image_carriers: default_image_carriers(),
        }
    }
}

fn default_nav_container() -> String {
    "#navigation_bar".into()
}
fn default_frame() -> String {
    "#ohb_topic".into()
}
fn default_image_carriers() -> String {
    r#"object[type="image/png"]"#.into()
}

// ---------------------------------------------------------------------------
// Harvest config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime harvest configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Run the browser without a visible UI.
    pub headless: bool,
    /// Stop after this many accepted sections.
    pub debug_cap: Option<usize>,
    /// Interval between frame reads while settling.
    pub settle_poll: Duration,
    /// Cap on the settle wait after each click.
    pub settle_max_wait: Duration,
    /// Fixed delay before each image carrier read.
    pub image_settle: Duration,
    /// Cap on the initial navigation-container wait.
    pub nav_wait: Duration,
    /// DOM selectors for the target site.
    pub selectors: SelectorsConfig,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            headless: config.defaults.headless,
            debug_cap: config.defaults.debug_cap,
            settle_poll: Duration::from_millis(config.defaults.settle_poll_ms),
            settle_max_wait: Duration::from_secs_f64(config.defaults.settle_max_wait_secs),
            image_settle: Duration::from_secs_f64(config.defaults.image_settle_secs),
            nav_wait: Duration::from_secs_f64(config.defaults.nav_wait_secs),
            selectors: config.selectors.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.manualpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ManualPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.manualpress/manualpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ManualPressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ManualPressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ManualPressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ManualPressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ManualPressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
