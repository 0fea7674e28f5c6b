//! Persistence sinks for finished records.
//!
//! # Submodules
//!
//! - [`json`]: buffers every record and writes one JSON list per run
//! - [`mongo`]: inserts each record into a document collection as soon as it
//!   is assembled (requires the `mongo` feature)
//!
//! # Output Structure (JSON sink)
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     └── evening.json
//! ```

pub mod json;
#[cfg(feature = "mongo")]
pub mod mongo;

use crate::error::SinkError;
use crate::models::ArticleRecord;

/// Destination for assembled records.
///
/// `store` is called concurrently from many record workers, once per
/// record, and is never retried. `finish` runs once after every record
/// has been stored.
pub trait ArticleSink {
    async fn store(&self, record: &ArticleRecord) -> Result<(), SinkError>;

    async fn finish(&self) -> Result<(), SinkError>;
}
