//! Page automation boundary for ManualPress.
//!
//! This crate provides:
//! - [`PageAutomation`] — the opaque driver interface the harvester consumes
//! - [`ChromePage`] — a chromiumoxide-backed implementation driving one
//!   Chrome page over CDP
//!
//! All DOM-specific traversal lives behind this seam, so the harvesting core
//! is testable against fixture pages with no browser attached.

pub mod chrome;
mod script;

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use manualpress_shared::Result;

pub use chrome::ChromePage;

/// One clickable item of the navigation tree, as seen in the live page.
///
/// `index` is the item's position within the flattened container and is the
/// stable key used to re-resolve the node after the page mutates; live DOM
/// handles are never held across clicks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavNode {
    pub index: usize,
    pub title: String,
    pub depth: u8,
}

/// Driver interface for one browser page.
///
/// Implementations own the page exclusively for the duration of a run; the
/// harvester is the only caller.
#[allow(async_fn_in_trait)]
pub trait PageAutomation {
    /// Navigate the page to `url` and wait for the navigation to commit.
    async fn goto(&self, url: &Url) -> Result<()>;

    /// Wait for `selector` to appear, polling until `timeout`.
    /// Returns `false` if the selector never appeared; the caller decides
    /// whether that is fatal.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Enumerate the navigation entries under `container` in document order,
    /// with their nesting depth. Returns `None` if the container is missing.
    async fn nav_entries(&self, container: &str) -> Result<Option<Vec<NavNode>>>;

    /// Click the navigation item at `index` within `container`.
    /// Returns `false` if the item could not be resolved.
    async fn activate_entry(&self, container: &str, index: usize) -> Result<bool>;

    /// Read the embedded frame's body markup. `None` while the frame or its
    /// sub-document has not loaded.
    async fn frame_body(&self, frame: &str) -> Result<Option<String>>;

    /// Re-encode the image carrier at `index` inside the frame through an
    /// in-page canvas and return it as a PNG data URL. `None` if the carrier
    /// cannot be resolved.
    async fn frame_image_png(
        &self,
        frame: &str,
        carriers: &str,
        index: usize,
    ) -> Result<Option<String>>;
}
