//! Markup scrapers.
//!
//! Scraping happens in two passes:
//!
//! 1. **Listing**: [`listing::extract_stubs`] breaks a rendered listing page
//!    into article stubs
//! 2. **Article**: [`article::fetch_body`] fetches one stub's detail page and
//!    reduces it to paragraph text
//!
//! Both use `scraper` selectors; neither ever treats a missing node as an
//! error.

pub mod article;
pub mod listing;
