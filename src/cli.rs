//! Command-line interface definitions for Medium Harvest.
//!
//! All arguments can be provided via command-line flags; the store
//! connection settings can also come from the environment (or a `.env`
//! file in the working directory).

use crate::models::RecordSchema;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Where finished records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// One JSON list per run under `--json-output-dir`.
    Json,
    /// One insert per record into a MongoDB collection.
    Mongo,
}

/// Command-line arguments for the Medium Harvest application.
///
/// # Examples
///
/// ```sh
/// # Write records to ./json_data/<date>/<edition>.json
/// medium_harvest --seeds json_data/medium_useful_links.json
///
/// # Insert into MongoDB, three browsers at a time
/// medium_harvest --sink mongo --mongo-uri mongodb://localhost:27017 --max-renderers 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file listing the seed pages: `[{"link_text": ..., "link_url": ...}]`
    #[arg(long, default_value = "json_data/medium_useful_links.json")]
    pub seeds: PathBuf,

    /// Optional path to a YAML pipeline config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Persistence sink
    #[arg(long, value_enum, default_value_t = SinkKind::Json)]
    pub sink: SinkKind,

    /// Record document shape
    #[arg(long, value_enum, default_value_t = RecordSchema::Full)]
    pub schema: RecordSchema,

    /// Output directory for the JSON sink
    #[arg(short, long, default_value = "json_data")]
    pub json_output_dir: String,

    /// MongoDB connection string (mongo sink)
    #[arg(long, env = "MONGO_URI")]
    pub mongo_uri: Option<String>,

    /// Database name (mongo sink)
    #[arg(long, env = "MONGO_DATABASE", default_value = "medium_data")]
    pub database: String,

    /// Collection name (mongo sink)
    #[arg(long, env = "MONGO_COLLECTION", default_value = "articles")]
    pub collection: String,

    /// Override the number of simultaneous browser instances
    #[arg(long)]
    pub max_renderers: Option<usize>,

    /// Override the number of simultaneous article workers
    #[arg(long)]
    pub record_concurrency: Option<usize>,
}
