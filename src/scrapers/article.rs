//! Article body fetching.
//!
//! The detail page of each stub is fetched with a plain GET (no browser)
//! and reduced to the text of its paragraphs.

use crate::error::BodyFetchError;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Fetch one article and return its body text.
///
/// Network failures are returned to the caller. A non-success status is
/// not an error; whatever body came back is parsed like any other.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `detail_link` - Absolute URL of the article page
///
/// # Returns
///
/// The paragraph text of the page, or a [`BodyFetchError`] when the link
/// does not parse or the request fails.
#[instrument(level = "info", skip(client), fields(%detail_link))]
pub async fn fetch_body(client: &Client, detail_link: &str) -> Result<String, BodyFetchError> {
    let url = Url::parse(detail_link).map_err(|source| BodyFetchError::InvalidLink {
        link: detail_link.to_string(),
        source,
    })?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Article fetch returned non-success status");
    }
    let body = response.text().await?;

    let content = paragraph_text(&body);
    info!(bytes = content.len(), "Parsed article body");
    debug!(preview = %truncate_for_log(&content, 300), "Article body");
    Ok(content)
}

/// Text of every `<p>` in document order, each followed by a newline.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut content = String::new();
    for para in document.select(&PARAGRAPH) {
        content.extend(para.text());
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_paragraphs_joined_with_trailing_newline() {
        let html = "<html><body><h1>Title</h1><p>Foo</p><div><p>Bar</p></div></body></html>";
        assert_eq!(paragraph_text(html), "Foo\nBar\n");
    }

    #[test]
    fn test_no_paragraphs_is_empty() {
        assert_eq!(paragraph_text("<html><body><div>x</div></body></html>"), "");
        assert_eq!(paragraph_text(""), "");
    }

    #[test]
    fn test_nested_inline_text_is_kept() {
        let html = "<p>Hello <strong>bold</strong> <a href='#'>link</a></p>";
        assert_eq!(paragraph_text(html), "Hello bold link\n");
    }

    #[test]
    fn test_empty_paragraph_still_emits_newline() {
        assert_eq!(paragraph_text("<p></p><p>x</p>"), "\nx\n");
    }

    #[tokio::test]
    async fn test_fetch_body_reads_paragraphs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/hello"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body><p>Foo</p><p>Bar</p></body></html>"),
            )
            .mount(&server)
            .await;

        let body = fetch_body(&Client::new(), &format!("{}/p/hello", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "Foo\nBar\n");
    }

    #[tokio::test]
    async fn test_fetch_body_tolerates_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<p>Not found</p>"))
            .mount(&server)
            .await;

        let body = fetch_body(&Client::new(), &format!("{}/p/gone", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "Not found\n");
    }

    #[tokio::test]
    async fn test_fetch_body_network_error() {
        // Nothing listens on port 1.
        let err = fetch_body(&Client::new(), "http://127.0.0.1:1/p/down")
            .await
            .unwrap_err();
        assert!(matches!(err, BodyFetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_body_invalid_link() {
        let err = fetch_body(&Client::new(), "/p/relative").await.unwrap_err();
        assert!(matches!(err, BodyFetchError::InvalidLink { .. }));
    }
}
