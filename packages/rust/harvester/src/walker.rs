//! Navigation walker.
//!
//! Discovers the ordered navigation entries once, up front, then activates
//! them one at a time: click, settle, hand the loaded frame body to the
//! extractor. One bad entry never aborts the run.

use tracing::{debug, info};
use url::Url;

use manualpress_automation::PageAutomation;
use manualpress_shared::{HarvestConfig, ManualPressError, NavigationEntry, Result};

use crate::settle;

/// Drives the page automation adapter through the manual's navigation tree.
///
/// The walker is the only component touching the page for the run's duration.
pub struct NavigationWalker<'a, P: PageAutomation> {
    page: &'a P,
    config: &'a HarvestConfig,
}

impl<'a, P: PageAutomation> NavigationWalker<'a, P> {
    pub fn new(page: &'a P, config: &'a HarvestConfig) -> Self {
        Self { page, config }
    }

    /// Open the manual's root page and wait for the navigation container.
    ///
    /// Failure here is run-fatal: without a navigation tree there is nothing
    /// to harvest.
    pub async fn open(&self, url: &Url) -> Result<()> {
        self.page.goto(url).await?;

        let container = &self.config.selectors.nav_container;
        let found = self.page.wait_for(container, self.config.nav_wait).await?;
        if !found {
            return Err(ManualPressError::validation(format!(
                "navigation container {container:?} not found at {url}"
            )));
        }

        debug!(%url, container, "root page ready");
        Ok(())
    }

    /// Capture all navigation entries in document order.
    ///
    /// Entries are captured before any click-driven navigation begins, since
    /// live node handles do not survive frame mutation.
    pub async fn traverse(&self) -> Result<Vec<NavigationEntry>> {
        let container = &self.config.selectors.nav_container;
        let nodes = self
            .page
            .nav_entries(container)
            .await?
            .ok_or_else(|| {
                ManualPressError::validation(format!(
                    "navigation container {container:?} disappeared during traversal"
                ))
            })?;

        if nodes.is_empty() {
            return Err(ManualPressError::validation(format!(
                "navigation container {container:?} holds no entries"
            )));
        }

        let entries: Vec<NavigationEntry> = nodes
            .into_iter()
            .map(|node| NavigationEntry {
                index: node.index,
                title: node.title,
                depth: node.depth,
            })
            .collect();

        info!(entries = entries.len(), "navigation tree captured");
        Ok(entries)
    }

    /// Click an entry and wait for the content frame to settle.
    ///
    /// Returns the loaded frame body markup. Fails with [`ContentTimeout`]
    /// when no content appears within the settle cap — an entry-local error
    /// the caller logs and skips.
    ///
    /// [`ContentTimeout`]: ManualPressError::ContentTimeout
    pub async fn activate(&self, entry: &NavigationEntry) -> Result<String> {
        let container = &self.config.selectors.nav_container;
        let frame = &self.config.selectors.frame;

        // The frame keeps the previous entry's body until the new content
        // renders; the pre-click baseline stops a stale read from settling.
        let baseline = self.page.frame_body(frame).await?;

        let clicked = self.page.activate_entry(container, entry.index).await?;
        if !clicked {
            return Err(ManualPressError::FrameNotFound {
                selector: format!("{container} li #{}", entry.index),
            });
        }

        let body = settle::poll_until_stable(
            async || self.page.frame_body(frame).await,
            baseline.as_deref().filter(|b| !b.is_empty()),
            self.config.settle_poll,
            self.config.settle_max_wait,
        )
        .await?;

        body.ok_or_else(|| ManualPressError::ContentTimeout {
            selector: frame.clone(),
            index: entry.index,
            title: entry.title.clone(),
        })
    }
}
