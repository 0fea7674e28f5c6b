//! Data models for every stage of the harvest.
//!
//! Values flow one way and are never mutated after creation:
//! - [`SeedLink`]: one entry of the seed file
//! - [`RenderedPage`]: a listing page after the headless render, or its error
//! - [`ArticleStub`]: one article summary pulled out of a listing page
//! - [`ArticleRecord`]: the persisted unit, either complete or a sentinel
//!
//! [`RecordSchema`] decides which document shape a record is written as.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Title and content of a record whose enrichment failed.
pub const FAILURE_MARKER: &str = "Error in article parsing!";

/// One entry of the seed file.
///
/// ```json
/// [{ "link_text": "Rust", "link_url": "https://medium.com/tag/rust" }]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedLink {
    /// Human label, unused by the pipeline.
    #[serde(default)]
    pub link_text: Option<String>,
    /// Listing page location, before the seed suffix is appended.
    pub link_url: String,
}

/// Rendered markup, or the error marker that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Rendered(String),
    Failed(String),
}

/// Output of the renderer pool for one seed URL.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL that was rendered.
    pub source_url: String,
    pub content: PageContent,
}

impl RenderedPage {
    pub fn is_failed(&self) -> bool {
        matches!(self.content, PageContent::Failed(_))
    }
}

/// An article summary extracted from a listing page, awaiting its body.
///
/// Any field may be missing when the matching markup node was absent.
/// Indices are zero-based; [`ArticleStub::position`] renders them one-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleStub {
    pub page_index: usize,
    pub stub_index: usize,
    pub title: Option<String>,
    pub detail_link: Option<String>,
    pub created_at: Option<String>,
    pub image_url: Option<String>,
}

impl ArticleStub {
    /// Composite `page.stub` position, e.g. `"2.5"`.
    pub fn position(&self) -> String {
        format!("{}.{}", self.page_index + 1, self.stub_index + 1)
    }
}

/// The persisted unit. Either complete, or a sentinel carrying
/// [`FAILURE_MARKER`] as title and content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub position: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: String,
    pub created_at: Option<String>,
    pub image_url: Option<String>,
    /// Local date (`YYYY-MM-DD`) of the batch that produced the record.
    pub scraped_on: String,
}

impl ArticleRecord {
    /// Merge a stub with its fetched body.
    pub fn complete(stub: &ArticleStub, content: String, scraped_on: &str) -> Self {
        Self {
            position: stub.position(),
            title: stub.title.clone(),
            link: stub.detail_link.clone(),
            content,
            created_at: stub.created_at.clone(),
            image_url: stub.image_url.clone(),
            scraped_on: scraped_on.to_string(),
        }
    }

    /// Placeholder for a stub that could not be enriched. Keeps whatever
    /// the stub already knew apart from its title.
    pub fn sentinel(stub: &ArticleStub, scraped_on: &str) -> Self {
        Self {
            position: stub.position(),
            title: Some(FAILURE_MARKER.to_string()),
            link: stub.detail_link.clone(),
            content: FAILURE_MARKER.to_string(),
            created_at: stub.created_at.clone(),
            image_url: stub.image_url.clone(),
            scraped_on: scraped_on.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.title.as_deref() == Some(FAILURE_MARKER) && self.content == FAILURE_MARKER
    }
}

/// Document shape written by the sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RecordSchema {
    /// Every field, keyed by `position`.
    #[default]
    Full,
    /// `article_index`, `article_title`, `article_link`, `article_content`.
    Compact,
}

impl RecordSchema {
    /// Field the store index is built on.
    #[cfg(feature = "mongo")]
    pub fn index_key(self) -> &'static str {
        match self {
            RecordSchema::Full => "position",
            RecordSchema::Compact => "article_index",
        }
    }

    /// Project a record into the document this schema stores.
    pub fn project(self, record: &ArticleRecord) -> Value {
        match self {
            RecordSchema::Full => json!({
                "position": record.position,
                "title": record.title,
                "link": record.link,
                "content": record.content,
                "created_at": record.created_at,
                "image_url": record.image_url,
                "scraped_on": record.scraped_on,
            }),
            RecordSchema::Compact => json!({
                "article_index": record.position,
                "article_title": record.title,
                "article_link": record.link,
                "article_content": record.content,
            }),
        }
    }
}
