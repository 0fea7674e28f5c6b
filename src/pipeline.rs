//! Pipeline coordination.
//!
//! A batch moves through `Start → Rendering → ExtractingAndFetching →
//! Draining → Done`. Rendering is the page tier: every seed URL goes through
//! the renderer pool and the coordinator waits for all of them. Extracting
//! and fetching is the record tier: each rendered page is broken into stubs
//! and every stub is fetched, assembled and stored as an independent unit of
//! work under a second, looser cap. Draining waits for the last record and
//! flushes the sink.
//!
//! The only shared mutable state is [`BatchStats`], a set of atomic
//! counters.

use crate::assembler::assemble;
use crate::config::{ListingSelectors, PipelineConfig};
use crate::error::ConfigError;
use crate::models::{ArticleStub, PageContent, RenderedPage};
use crate::outputs::ArticleSink;
use crate::render::{Renderer, render_all};
use crate::scrapers::listing::extract_stubs;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Everything a batch reads but never changes, built once at startup and
/// passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub selectors: ListingSelectors,
    /// Shared client for the per-article fetches.
    pub client: Client,
    /// Local date stamped on every record of the batch.
    pub scraped_on: String,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, scraped_on: String) -> Result<Self, ConfigError> {
        let selectors = config.selectors.compile()?;
        Ok(Self {
            config,
            selectors,
            client: Client::new(),
            scraped_on,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Rendering,
    ExtractingAndFetching,
    Draining,
    Done,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Start => Stage::Rendering,
            Stage::Rendering => Stage::ExtractingAndFetching,
            Stage::ExtractingAndFetching => Stage::Draining,
            Stage::Draining | Stage::Done => Stage::Done,
        }
    }
}

/// Completion counters shared by every worker of a batch.
#[derive(Debug, Default)]
pub struct BatchStats {
    pages_rendered: AtomicUsize,
    pages_failed: AtomicUsize,
    stubs: AtomicUsize,
    complete: AtomicUsize,
    sentinels: AtomicUsize,
    stored: AtomicUsize,
    store_failures: AtomicUsize,
}

impl BatchStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, stage: Stage, elapsed: Duration) -> BatchReport {
        BatchReport {
            stage,
            pages_rendered: self.pages_rendered.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            stubs: self.stubs.load(Ordering::Relaxed),
            complete: self.complete.load(Ordering::Relaxed),
            sentinels: self.sentinels.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// What a finished batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub stage: Stage,
    pub pages_rendered: usize,
    pub pages_failed: usize,
    pub stubs: usize,
    pub complete: usize,
    pub sentinels: usize,
    pub stored: usize,
    pub store_failures: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Records assembled, of either shape.
    pub fn records(&self) -> usize {
        self.complete + self.sentinels
    }
}

/// Runs one batch from seed URLs to stored records.
pub struct Pipeline<'a, R, S> {
    ctx: &'a PipelineContext,
    renderer: &'a R,
    sink: &'a S,
    stats: BatchStats,
}

impl<'a, R: Renderer, S: ArticleSink> Pipeline<'a, R, S> {
    pub fn new(ctx: &'a PipelineContext, renderer: &'a R, sink: &'a S) -> Self {
        Self {
            ctx,
            renderer,
            sink,
            stats: BatchStats::default(),
        }
    }

    fn enter(&self, current: Stage) -> Stage {
        let next = current.next();
        info!(from = ?current, to = ?next, "Pipeline stage change");
        next
    }

    /// Run the whole batch. Per-page and per-record failures are absorbed
    /// and counted; this never fails.
    ///
    /// # Arguments
    ///
    /// * `seeds` - Listing-page URLs, already suffixed
    ///
    /// # Returns
    ///
    /// A [`BatchReport`] with per-outcome counts and elapsed time. By the
    /// time it is returned every record has been stored and the sink is
    /// finished.
    #[instrument(level = "info", skip_all, fields(seeds = seeds.len()))]
    pub async fn run(self, seeds: &[String]) -> BatchReport {
        let t0 = Instant::now();
        let mut stage = Stage::Start;

        stage = self.enter(stage);
        let pages = render_all(self.renderer, seeds, self.ctx.config.max_renderers).await;
        for page in &pages {
            if page.is_failed() {
                BatchStats::bump(&self.stats.pages_failed);
            } else {
                BatchStats::bump(&self.stats.pages_rendered);
            }
        }

        stage = self.enter(stage);
        stream::iter(pages.into_iter().enumerate())
            .flat_map(|(page_index, page)| stream::iter(self.stubs_for(page_index, page)))
            .map(|stub| self.process_stub(stub))
            .buffer_unordered(self.ctx.config.record_concurrency)
            .collect::<Vec<()>>()
            .await;

        stage = self.enter(stage);
        if let Err(e) = self.sink.finish().await {
            error!(error = %e, "Failed to flush sink");
        }

        stage = self.enter(stage);
        let report = self.stats.snapshot(stage, t0.elapsed());
        info!(
            pages_rendered = report.pages_rendered,
            pages_failed = report.pages_failed,
            stubs = report.stubs,
            complete = report.complete,
            sentinels = report.sentinels,
            stored = report.stored,
            store_failures = report.store_failures,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch complete"
        );
        report
    }

    fn stubs_for(&self, page_index: usize, page: RenderedPage) -> Vec<ArticleStub> {
        let stubs = match &page.content {
            PageContent::Rendered(html) => {
                extract_stubs(page_index, &page.source_url, html, &self.ctx.selectors)
            }
            PageContent::Failed(marker) => {
                warn!(url = %page.source_url, %marker, "Skipping extraction for failed render");
                Vec::new()
            }
        };
        self.stats.stubs.fetch_add(stubs.len(), Ordering::Relaxed);
        stubs
    }

    /// Fetch, assemble and store one stub.
    async fn process_stub(&self, stub: ArticleStub) {
        let record = assemble(&self.ctx.client, &stub, &self.ctx.scraped_on).await;
        if record.is_sentinel() {
            BatchStats::bump(&self.stats.sentinels);
        } else {
            BatchStats::bump(&self.stats.complete);
        }

        match self.sink.store(&record).await {
            Ok(()) => BatchStats::bump(&self.stats.stored),
            Err(e) => {
                error!(position = %record.position, error = %e, "Failed to store record; it is lost for this run");
                BatchStats::bump(&self.stats.store_failures);
            }
        }
    }
}
