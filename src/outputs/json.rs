//! Local JSON file sink.
//!
//! Records are buffered as they arrive and written out as a single JSON
//! list when the batch drains, so the file is only ever complete. The file
//! path is `{json_output_dir}/{date}/{time_of_day}.json`.

use super::ArticleSink;
use crate::error::SinkError;
use crate::models::{ArticleRecord, RecordSchema};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    schema: RecordSchema,
    documents: Mutex<Vec<Value>>,
}

impl JsonFileSink {
    pub fn new(json_output_dir: &str, local_date: &str, time_of_day: &str, schema: RecordSchema) -> Self {
        let path = Path::new(json_output_dir)
            .join(local_date)
            .join(format!("{time_of_day}.json"));
        Self {
            path,
            schema,
            documents: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArticleSink for JsonFileSink {
    async fn store(&self, record: &ArticleRecord) -> Result<(), SinkError> {
        let document = self.schema.project(record);
        self.documents.lock().await.push(document);
        debug!(position = %record.position, "Buffered record for JSON output");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn finish(&self) -> Result<(), SinkError> {
        let documents = self.documents.lock().await;
        let json = serde_json::to_string_pretty(&*documents)?;

        if let Some(dir) = self.path.parent() {
            info!(dir = %dir.display(), "Ensuring JSON directory exists");
            if let Err(e) = fs::create_dir_all(dir).await {
                error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
                return Err(e.into());
            }
        }

        fs::write(&self.path, json).await?;
        info!(count = documents.len(), "Wrote JSON records file");
        Ok(())
    }
}
