//! Listing page rendering.
//!
//! Listing pages load their articles lazily while the reader scrolls, so a
//! plain GET is not enough: each seed URL goes through a [`Renderer`] that
//! drives a real browser.
//!
//! [`render_all`] is the page-tier worker pool. It keeps at most
//! `max_concurrency` renders in flight, never fails as a whole, and returns
//! exactly one [`RenderedPage`] per input URL, in input order.

pub mod chrome;

use crate::error::RenderError;
use crate::models::{PageContent, RenderedPage};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, instrument};

/// Something that turns a URL into fully rendered markup.
pub trait Renderer {
    /// Render `url` and return the final page source.
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Render every URL with bounded concurrency.
///
/// A failed render becomes [`PageContent::Failed`] holding an `Error: ...`
/// marker. Completion order does not matter: a slow page only holds its
/// own slot, and the output is put back in input order at the end.
///
/// # Arguments
///
/// * `renderer` - Browser backend doing the actual rendering
/// * `urls` - Listing-page URLs, one per seed
/// * `max_concurrency` - Upper bound on renders in flight
///
/// # Returns
///
/// One [`RenderedPage`] per input URL, in input order.
#[instrument(level = "info", skip_all, fields(urls = urls.len(), max_concurrency = max_concurrency))]
pub async fn render_all<R: Renderer>(
    renderer: &R,
    urls: &[String],
    max_concurrency: usize,
) -> Vec<RenderedPage> {
    let t0 = Instant::now();

    let mut indexed: Vec<(usize, RenderedPage)> = stream::iter(urls.iter().enumerate())
        .map(|(i, url)| async move {
            let content = match renderer.render(url).await {
                Ok(html) => {
                    info!(index = i, %url, bytes = html.len(), "Rendered listing page");
                    PageContent::Rendered(html)
                }
                Err(e) => {
                    error!(index = i, %url, error = %e, "Render failed");
                    PageContent::Failed(format!("Error: {e}"))
                }
            };
            (
                i,
                RenderedPage {
                    source_url: url.clone(),
                    content,
                },
            )
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    indexed.sort_by_key(|(i, _)| *i);
    let pages: Vec<RenderedPage> = indexed.into_iter().map(|(_, page)| page).collect();

    let failed = pages.iter().filter(|p| p.is_failed()).count();
    info!(
        total = pages.len(),
        failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Rendering complete"
    );
    pages
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned markup per URL; unknown URLs fail.
    #[derive(Default)]
    pub(crate) struct FakeRenderer {
        pub pages: HashMap<String, String>,
        pub delays: HashMap<String, Duration>,
        pub in_flight: AtomicUsize,
        pub peak: AtomicUsize,
        pub calls: AtomicUsize,
    }

    impl FakeRenderer {
        pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    impl Renderer for FakeRenderer {
        async fn render(&self, url: &str) -> Result<String, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(url)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| RenderError::Config(format!("no page for {url}")))
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://s{i}.example/latest")).collect()
    }

    #[tokio::test]
    async fn test_one_page_per_url_even_when_renders_fail() {
        let renderer = FakeRenderer::default()
            .with_page("https://b.example/", "<html><body>ok</body></html>");
        let urls = vec![
            "https://a.example/".to_string(),
            "https://b.example/".to_string(),
        ];

        let pages = render_all(&renderer, &urls, 7).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].source_url, "https://a.example/");
        assert!(matches!(&pages[0].content, PageContent::Failed(m) if m.starts_with("Error: ")));
        assert_eq!(pages[1].source_url, "https://b.example/");
        assert!(matches!(&pages[1].content, PageContent::Rendered(_)));
    }

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let urls = urls(4);
        let mut renderer = FakeRenderer::default()
            .with_delay(&urls[0], Duration::from_millis(60))
            .with_delay(&urls[1], Duration::from_millis(1));
        for url in &urls {
            renderer = renderer.with_page(url, url);
        }

        let pages = render_all(&renderer, &urls, 4).await;

        let got: Vec<&str> = pages.iter().map(|p| p.source_url.as_str()).collect();
        let want: Vec<&str> = urls.iter().map(String::as_str).collect();
        assert_eq!(got, want);
        for page in &pages {
            assert_eq!(page.content, PageContent::Rendered(page.source_url.clone()));
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let urls = urls(10);
        let renderer = FakeRenderer::default();

        let pages = render_all(&renderer, &urls, 3).await;

        assert_eq!(pages.len(), 10);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 10);
        let peak = renderer.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight renders was {peak}");
        assert!(peak >= 2, "renders never overlapped");
    }

    #[tokio::test]
    async fn test_slow_page_does_not_stall_others() {
        let urls = urls(3);
        let renderer = FakeRenderer::default()
            .with_delay(&urls[0], Duration::from_millis(200));

        let t0 = Instant::now();
        let pages = render_all(&renderer, &urls, 2).await;

        assert_eq!(pages.len(), 3);
        // The two fast pages share the second slot while the first is held.
        assert!(t0.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_empty_seed_list() {
        let pages = render_all(&FakeRenderer::default(), &[], 7).await;
        assert!(pages.is_empty());
    }
}
