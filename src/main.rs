//! # Medium Harvest
//!
//! Harvests articles from lazily loaded listing pages. Each listing page is
//! rendered in headless Chrome and scrolled until its articles appear; every
//! article summary on it is then fetched in full and persisted.
//!
//! ## Usage
//!
//! ```sh
//! medium_harvest --seeds json_data/medium_useful_links.json -j ./json_data
//! ```
//!
//! ## Architecture
//!
//! The application follows a two-tier pipeline:
//! 1. **Rendering**: seed URLs are rendered by a bounded pool of browsers (7 at a time)
//! 2. **Extracting**: each rendered page is split into article stubs
//! 3. **Fetching**: each stub's article body is fetched and assembled into a record
//! 4. **Output**: records go to a JSON file or a MongoDB collection
//!
//! A failed render, fetch or store only ever costs its own page or record.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assembler;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod render;
mod scrapers;
mod utils;

use cli::{Cli, SinkKind};
use config::{PipelineConfig, load_seed_urls};
use outputs::{ArticleSink, json::JsonFileSink};
use pipeline::{Pipeline, PipelineContext};
use render::chrome::ChromeRenderer;
use utils::{ensure_writable_dir, local_date, time_of_day};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("medium_harvest starting up");

    // .env may carry MONGO_URI; a missing file is fine.
    if let Err(e) = dotenv::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Load config & seeds ----
    let config = PipelineConfig::load(args.config.as_deref())?
        .with_overrides(args.max_renderers, args.record_concurrency);
    let seeds = load_seed_urls(&args.seeds, &config)?;
    info!(
        seeds = seeds.len(),
        max_renderers = config.max_renderers,
        record_concurrency = config.record_concurrency,
        "Configuration ready"
    );

    let ctx = PipelineContext::new(config, local_date())?;
    let renderer = ChromeRenderer::new(ctx.config.scroll, ctx.config.chrome_executable.clone());

    // ---- Pick a sink and run ----
    match args.sink {
        SinkKind::Json => {
            if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
                error!(
                    path = %args.json_output_dir,
                    error = %e,
                    "JSON output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
            let sink = JsonFileSink::new(
                &args.json_output_dir,
                &ctx.scraped_on,
                &time_of_day(),
                args.schema,
            );
            info!(path = %sink.path().display(), "Writing records to JSON");
            run(&ctx, &renderer, &sink, &seeds).await;
        }
        SinkKind::Mongo => {
            #[cfg(feature = "mongo")]
            {
                let uri = args.mongo_uri.as_deref().ok_or("--mongo-uri or MONGO_URI is required for the mongo sink")?;
                let sink = match outputs::mongo::MongoSink::connect(
                    uri,
                    &args.database,
                    &args.collection,
                    args.schema,
                )
                .await
                {
                    Ok(sink) => sink,
                    Err(e) => {
                        error!(error = %e, "Cannot connect to document store");
                        return Err(e.into());
                    }
                };
                run(&ctx, &renderer, &sink, &seeds).await;
            }
            #[cfg(not(feature = "mongo"))]
            {
                error!("This build has no mongo sink; rebuild with `--features mongo`");
                return Err("mongo sink not compiled in".into());
            }
        }
    }

    Ok(())
}

async fn run<S: ArticleSink>(
    ctx: &PipelineContext,
    renderer: &ChromeRenderer,
    sink: &S,
    seeds: &[String],
) {
    let report = Pipeline::new(ctx, renderer, sink).run(seeds).await;
    info!(
        records = report.records(),
        sentinels = report.sentinels,
        store_failures = report.store_failures,
        secs = report.elapsed.as_secs(),
        millis = report.elapsed.subsec_millis(),
        "Execution complete"
    );
}
