//! Document-store sink.
//!
//! Each record is inserted the moment it is assembled. Inserts are
//! unconditional; the store decides whether duplicates are allowed.

use super::ArticleSink;
use crate::error::SinkError;
use crate::models::{ArticleRecord, RecordSchema};
use mongodb::bson::{self, Document};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct MongoSink {
    client: Client,
    collection: Collection<Document>,
    schema: RecordSchema,
}

impl MongoSink {
    /// Connect and make sure the position index exists.
    ///
    /// This is the one failure that ends a run before any work starts.
    #[instrument(level = "info", skip(uri))]
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        schema: RecordSchema,
    ) -> Result<Self, SinkError> {
        let client = Client::with_uri_str(uri).await?;
        let collection = client.database(database).collection::<Document>(collection);

        let mut keys = Document::new();
        keys.insert(schema.index_key(), -1i32);
        collection
            .create_index(IndexModel::builder().keys(keys).build())
            .await?;
        info!(index = schema.index_key(), "Connected to document store");

        Ok(Self {
            client,
            collection,
            schema,
        })
    }
}

impl ArticleSink for MongoSink {
    async fn store(&self, record: &ArticleRecord) -> Result<(), SinkError> {
        let document = bson::to_document(&self.schema.project(record))?;
        self.collection.insert_one(document).await?;
        debug!(position = %record.position, "Inserted record");
        Ok(())
    }

    async fn finish(&self) -> Result<(), SinkError> {
        self.client.clone().shutdown().await;
        info!("Closed document store connection");
        Ok(())
    }
}
