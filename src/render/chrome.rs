//! Headless Chrome renderer.
//!
//! Every render launches its own browser process, scrolls the page to the
//! bottom a fixed number of times so lazily loaded articles appear, grabs
//! the page source and tears the browser down again, whether or not the
//! render succeeded.

use super::Renderer;
use crate::config::ScrollPlan;
use crate::error::RenderError;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Launches one headless Chrome per [`Renderer::render`] call.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    scroll: ScrollPlan,
    executable: Option<PathBuf>,
}

impl ChromeRenderer {
    pub fn new(scroll: ScrollPlan, executable: Option<PathBuf>) -> Self {
        Self { scroll, executable }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--log-level=3");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Config)
    }

    /// Navigate, scroll, capture. The caller owns browser teardown.
    async fn capture(&self, browser: &Browser, url: &str) -> Result<String, RenderError> {
        let page: Page = browser.new_page(url).await?;
        page.wait_for_navigation().await?;

        for i in 0..self.scroll.iterations {
            sleep(self.scroll.delay()).await;
            page.evaluate(SCROLL_TO_BOTTOM).await?;
            if (i + 1) % 25 == 0 {
                debug!(iteration = i + 1, "Scrolled listing page");
            }
        }

        let html = page.content().await?;
        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close page");
        }
        Ok(html)
    }
}

impl Renderer for ChromeRenderer {
    #[instrument(level = "info", skip(self), fields(iterations = self.scroll.iterations))]
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let t0 = Instant::now();
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?).await?;

        // The CDP handler has to be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.capture(&browser, url).await;

        if let Err(e) = browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Failed to reap browser process");
        }
        handler_task.abort();

        info!(
            ok = result.is_ok(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Browser session finished"
        );
        result
    }
}
