//! chromiumoxide-backed implementation of [`PageAutomation`].
//!
//! Owns one browser process and one page for the duration of a run. All
//! DOM interaction is routed through CDP `Runtime.evaluate` using the
//! builders in [`script`](crate::script).

use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use manualpress_shared::{ManualPressError, Result};

use crate::{NavNode, PageAutomation, script};

/// Poll interval for [`PageAutomation::wait_for`].
const WAIT_POLL: Duration = Duration::from_millis(200);

/// A single Chrome page driven over CDP.
pub struct ChromePage {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromePage {
    /// Launch a browser and open a blank page.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| ManualPressError::automation(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ManualPressError::automation(format!("browser launch: {e}")))?;

        // The CDP event stream must be drained for the connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ManualPressError::automation(format!("new page: {e}")))?;

        info!(headless, "browser launched");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Close the page and shut the browser down.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| ManualPressError::automation(format!("browser close: {e}")))?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }

    /// Evaluate a script and deserialize its completion value.
    async fn eval<T: DeserializeOwned>(&self, js: String) -> Result<T> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| ManualPressError::automation(format!("evaluate: {e}")))?;
        result
            .into_value::<T>()
            .map_err(|e| ManualPressError::automation(format!("evaluate result: {e}")))
    }
}

impl PageAutomation for ChromePage {
    async fn goto(&self, url: &Url) -> Result<()> {
        debug!(%url, "navigating");
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| ManualPressError::automation(format!("goto {url}: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ManualPressError::automation(format!("navigation to {url}: {e}")))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval::<bool>(script::selector_present(selector)).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    async fn nav_entries(&self, container: &str) -> Result<Option<Vec<NavNode>>> {
        self.eval(script::nav_entries(container)).await
    }

    async fn activate_entry(&self, container: &str, index: usize) -> Result<bool> {
        self.eval(script::activate_entry(container, index)).await
    }

    async fn frame_body(&self, frame: &str) -> Result<Option<String>> {
        self.eval(script::frame_body(frame)).await
    }

    async fn frame_image_png(
        &self,
        frame: &str,
        carriers: &str,
        index: usize,
    ) -> Result<Option<String>> {
        self.eval(script::frame_image_png(frame, carriers, index))
            .await
    }
}
