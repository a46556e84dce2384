//! Shared types, error model, and configuration for ManualPress.
//!
//! This crate is the foundation depended on by all other ManualPress crates.
//! It provides:
//! - [`ManualPressError`] — the unified error type
//! - Domain types ([`NavigationEntry`], [`RawSection`], [`Section`], [`Document`], [`Fingerprint`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HarvestConfig, SelectorsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{ManualPressError, Result};
pub use types::{
    Document, Fingerprint, HarvestSummary, ImagePayload, MAX_HEADING_DEPTH, NavigationEntry,
    RawSection, RunId, Section,
};
