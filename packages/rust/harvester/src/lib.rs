//! Navigation traversal, content extraction, and dedup for ManualPress.
//!
//! This crate provides:
//! - [`NavigationWalker`] — captures the navigation tree and activates entries
//! - [`settle`] — bounded poll-until-stable wait for client-side rendering
//! - [`extract`] — typed frame-body extraction (heading-stripped text + image carriers)
//! - [`SeenFingerprints`] — run-scoped duplicate-content detection

pub mod dedup;
pub mod extract;
pub mod settle;
pub mod walker;

pub use dedup::{DedupDecision, SeenFingerprints};
pub use extract::{ExtractedBody, decode_png_data_url, extract_body, fetch_images};
pub use walker::NavigationWalker;
