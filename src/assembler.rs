//! Record assembly.
//!
//! [`try_assemble`] is the only fallible step between a stub and its
//! record; [`assemble`] turns its failure into a sentinel. Nothing that goes
//! wrong for one stub leaves this module.

use crate::error::AssembleError;
use crate::models::{ArticleRecord, ArticleStub};
use crate::scrapers::article::fetch_body;
use reqwest::Client;
use tracing::{debug, instrument, warn};

/// Fetch the stub's body and merge it into a complete record.
pub async fn try_assemble(
    client: &Client,
    stub: &ArticleStub,
    scraped_on: &str,
) -> Result<ArticleRecord, AssembleError> {
    let link = stub
        .detail_link
        .as_deref()
        .ok_or(AssembleError::MissingDetailLink)?;
    let content = fetch_body(client, link).await?;
    Ok(ArticleRecord::complete(stub, content, scraped_on))
}

/// Always produce a record: complete when enrichment worked, otherwise a
/// sentinel keeping whatever the stub already had.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `stub` - Article summary from a listing page
/// * `scraped_on` - Batch date stamped on the record
///
/// # Returns
///
/// A complete [`ArticleRecord`], or its sentinel when the stub has no detail
/// link or the body fetch failed.
#[instrument(level = "info", skip_all, fields(position = %stub.position()))]
pub async fn assemble(client: &Client, stub: &ArticleStub, scraped_on: &str) -> ArticleRecord {
    match try_assemble(client, stub, scraped_on).await {
        Ok(record) => {
            debug!(bytes = record.content.len(), "Assembled complete record");
            record
        }
        Err(e) => {
            warn!(link = ?stub.detail_link, error = %e, "Article enrichment failed; storing sentinel");
            ArticleRecord::sentinel(stub, scraped_on)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FAILURE_MARKER;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DATE: &str = "2025-05-06";

    fn stub(link: Option<String>) -> ArticleStub {
        ArticleStub {
            page_index: 0,
            stub_index: 2,
            title: Some("Hello".to_string()),
            detail_link: link,
            created_at: Some("Oct 3".to_string()),
            image_url: Some("https://cdn.example/a.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_link_is_sentinel() {
        let stub = stub(None);
        let err = try_assemble(&Client::new(), &stub, DATE).await.unwrap_err();
        assert!(matches!(err, AssembleError::MissingDetailLink));

        let record = assemble(&Client::new(), &stub, DATE).await;
        assert!(record.is_sentinel());
        assert_eq!(record.link, None);
        assert_eq!(record.position, "1.3");
        assert_eq!(record.created_at.as_deref(), Some("Oct 3"));
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[tokio::test]
    async fn test_network_error_is_sentinel_with_link() {
        let link = "http://127.0.0.1:1/p/down".to_string();
        let record = assemble(&Client::new(), &stub(Some(link.clone())), DATE).await;

        assert_eq!(record.title.as_deref(), Some(FAILURE_MARKER));
        assert_eq!(record.content, FAILURE_MARKER);
        assert_eq!(record.link, Some(link));
    }

    #[tokio::test]
    async fn test_successful_fetch_is_complete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Foo</p><p>Bar</p>"))
            .mount(&server)
            .await;

        let link = format!("{}/p/hello", server.uri());
        let record = assemble(&Client::new(), &stub(Some(link.clone())), DATE).await;

        assert!(!record.is_sentinel());
        assert_eq!(record.title.as_deref(), Some("Hello"));
        assert_eq!(record.link, Some(link));
        assert_eq!(record.content, "Foo\nBar\n");
        assert_eq!(record.scraped_on, DATE);
    }

    #[tokio::test]
    async fn test_empty_body_is_still_complete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let link = format!("{}/p/empty", server.uri());
        let record = try_assemble(&Client::new(), &stub(Some(link)), DATE)
            .await
            .unwrap();
        assert_eq!(record.content, "");
        assert!(!record.is_sentinel());
    }
}
