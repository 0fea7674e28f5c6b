//! Error types for each pipeline stage.
//!
//! Every stage owns its own error enum and converts it at its own boundary:
//! a render error becomes an error-marker page, an assemble error becomes a
//! sentinel record, a sink error is logged and counted. Only
//! [`ConfigError`] and a store connection failure ever reach `main`.

use thiserror::Error;

/// Failure while driving the headless renderer for one listing page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid browser configuration: {0}")]
    Config(String),
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
}

/// Failure of the secondary per-article fetch.
#[derive(Debug, Error)]
pub enum BodyFetchError {
    #[error("invalid detail link {link:?}: {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Reasons a stub could not be turned into a complete record.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("stub has no detail link")]
    MissingDetailLink,
    #[error("body fetch failed: {0}")]
    BodyFetch(#[from] BodyFetchError),
}

/// Failure writing to, or flushing, a persistence sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[cfg(feature = "mongo")]
    #[error("document store error: {0}")]
    Store(#[from] mongodb::error::Error),
    #[cfg(feature = "mongo")]
    #[error("bson conversion error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

/// Startup configuration problems. These end the run before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid seed file: {0}")]
    Seeds(#[from] serde_json::Error),
    #[error("invalid `{name}` selector {selector:?}: {message}")]
    Selector {
        name: &'static str,
        selector: String,
        message: String,
    },
}
