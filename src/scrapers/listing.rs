//! Listing page extraction.
//!
//! A rendered listing page holds a repeated article-summary block. Each
//! block becomes one [`ArticleStub`]; every field is looked up on its own,
//! so a block missing its title still yields its link, date and image.

use crate::config::ListingSelectors;
use crate::models::ArticleStub;
use crate::utils::truncate_for_log;
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument};
use url::Url;

/// Pull every article summary out of one rendered listing page.
///
/// Stubs come back in document order. No matching block yields an empty
/// list. Relative detail links are resolved against `source_url`.
///
/// # Arguments
///
/// * `page_index` - Zero-based index of the page in the seed list
/// * `source_url` - The URL the page was rendered from
/// * `content` - The rendered markup
/// * `selectors` - Compiled listing selectors
///
/// # Returns
///
/// One [`ArticleStub`] per matching block. A block without a usable detail
/// link gets `detail_link = None`.
#[instrument(level = "info", skip(content, selectors), fields(bytes = content.len()))]
pub fn extract_stubs(
    page_index: usize,
    source_url: &str,
    content: &str,
    selectors: &ListingSelectors,
) -> Vec<ArticleStub> {
    let document = Html::parse_document(content);
    let base = Url::parse(source_url).ok();

    let stubs: Vec<ArticleStub> = document
        .select(&selectors.article)
        .enumerate()
        .map(|(stub_index, block)| {
            let stub = ArticleStub {
                page_index,
                stub_index,
                title: first_text(block, &selectors.title),
                detail_link: detail_link(block, selectors, base.as_ref()),
                created_at: first_text(block, &selectors.created_at),
                image_url: image_url(block, selectors),
            };
            debug!(
                position = %stub.position(),
                title = ?stub.title,
                link = ?stub.detail_link,
                "Extracted article stub"
            );
            stub
        })
        .collect();

    if stubs.is_empty() {
        debug!(preview = %truncate_for_log(content, 200), "No article blocks on page");
    }
    info!(count = stubs.len(), "Extracted article stubs");
    stubs
}

/// Text of the first descendant matching `selector`.
fn first_text(block: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    block
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>())
}

fn detail_link(
    block: ElementRef<'_>,
    selectors: &ListingSelectors,
    base: Option<&Url>,
) -> Option<String> {
    let href = block
        .select(&selectors.link)
        .next()?
        .value()
        .attr(&selectors.link_attr)
        .filter(|href| !href.trim().is_empty())?;

    match base.and_then(|base| base.join(href).ok()) {
        Some(resolved) => Some(resolved.to_string()),
        None => Some(href.to_string()),
    }
}

/// The image container's `src`, else its nested `img` `src`. A container
/// without an `img` counts as no image.
fn image_url(block: ElementRef<'_>, selectors: &ListingSelectors) -> Option<String> {
    let container = block.select(&selectors.image).next()?;
    let img = container.select(&selectors.image_img).next()?;
    container
        .value()
        .attr("src")
        .or_else(|| img.value().attr("src"))
        .map(str::to_owned)
}
