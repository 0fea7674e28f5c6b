//! Pipeline configuration.
//!
//! Tunables live in an optional YAML file; every field has a default so an
//! absent file, or a file naming only a few keys, is fine. The CLI can
//! override the two concurrency caps afterwards.
//!
//! ```yaml
//! seed_suffix: /latest
//! max_renderers: 7
//! record_concurrency: 32
//! scroll:
//!   iterations: 100
//!   delay_ms: 500
//! selectors:
//!   article: div[class="ab cm"]
//!   link: div[role="link"]
//!   link_attr: data-href
//! ```

use crate::error::ConfigError;
use crate::models::SeedLink;
use scraper::Selector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Everything the pipeline needs to know besides where to write.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Appended to every seed `link_url` before rendering.
    pub seed_suffix: String,
    /// Simultaneous headless browser instances.
    pub max_renderers: usize,
    /// Simultaneous fetch-assemble-store units.
    pub record_concurrency: usize,
    pub scroll: ScrollPlan,
    /// Chrome binary to launch instead of the one on `PATH`.
    pub chrome_executable: Option<PathBuf>,
    pub selectors: SelectorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed_suffix: "/latest".to_string(),
            max_renderers: 7,
            record_concurrency: 32,
            scroll: ScrollPlan::default(),
            chrome_executable: None,
            selectors: SelectorConfig::default(),
        }
    }
}

/// How long to keep scrolling a listing page so lazy content loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScrollPlan {
    pub iterations: u32,
    pub delay_ms: u64,
}

impl Default for ScrollPlan {
    fn default() -> Self {
        Self {
            iterations: 100,
            delay_ms: 500,
        }
    }
}

impl ScrollPlan {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// CSS selectors locating the article summaries on a listing page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One match per article summary.
    pub article: String,
    pub title: String,
    /// Node carrying the detail link in `link_attr`.
    pub link: String,
    pub link_attr: String,
    pub created_at: String,
    /// Image container; must contain an `img` to count.
    pub image: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            article: r#"div[class="ab cm"]"#.to_string(),
            title: "h2".to_string(),
            link: r#"div[role="link"]"#.to_string(),
            link_attr: "data-href".to_string(),
            created_at: r#"div[data-testid="storyPublishDate"]"#.to_string(),
            image: "picture".to_string(),
        }
    }
}

/// [`SelectorConfig`] after parsing, ready for the listing extractor.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub article: Selector,
    pub title: Selector,
    pub link: Selector,
    pub link_attr: String,
    pub created_at: Selector,
    pub image: Selector,
    pub image_img: Selector,
}

impl SelectorConfig {
    /// Parse every selector, naming the first one that is invalid.
    pub fn compile(&self) -> Result<ListingSelectors, ConfigError> {
        Ok(ListingSelectors {
            article: parse_selector("article", &self.article)?,
            title: parse_selector("title", &self.title)?,
            link: parse_selector("link", &self.link)?,
            link_attr: self.link_attr.clone(),
            created_at: parse_selector("created_at", &self.created_at)?,
            image: parse_selector("image", &self.image)?,
            image_img: parse_selector("image", "img")?,
        })
    }
}

fn parse_selector(name: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        name,
        selector: selector.to_string(),
        message: format!("{e:?}"),
    })
}

impl PipelineConfig {
    /// Load from `path`, or use defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                let parsed: PipelineConfig = serde_yaml::from_str(&raw)?;
                info!(path = %path.display(), "Loaded pipeline configuration");
                parsed
            }
            None => {
                info!("No config file given; using defaults");
                PipelineConfig::default()
            }
        };
        Ok(config.normalized())
    }

    /// Apply CLI overrides for the two concurrency caps.
    pub fn with_overrides(
        mut self,
        max_renderers: Option<usize>,
        record_concurrency: Option<usize>,
    ) -> Self {
        if let Some(n) = max_renderers {
            self.max_renderers = n;
        }
        if let Some(n) = record_concurrency {
            self.record_concurrency = n;
        }
        self.normalized()
    }

    /// A cap of zero would never schedule anything.
    fn normalized(mut self) -> Self {
        self.max_renderers = self.max_renderers.max(1);
        self.record_concurrency = self.record_concurrency.max(1);
        self
    }

    /// Listing-page URL for a seed entry.
    pub fn seed_url(&self, seed: &SeedLink) -> String {
        format!("{}{}", seed.link_url.trim_end_matches('/'), self.seed_suffix)
    }
}

/// Read the seed file and turn each entry into a listing-page URL.
#[instrument(level = "info", skip(config))]
pub fn load_seed_urls(path: &Path, config: &PipelineConfig) -> Result<Vec<String>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let seeds: Vec<SeedLink> = serde_json::from_str(&raw)?;
    let urls: Vec<String> = seeds.iter().map(|seed| config.seed_url(seed)).collect();
    info!(count = urls.len(), "Loaded seed URLs");
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.seed_suffix, "/latest");
        assert_eq!(config.max_renderers, 7);
        assert_eq!(config.scroll, ScrollPlan { iterations: 100, delay_ms: 500 });
        assert_eq!(config.scroll.delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = PipelineConfig::load(None).unwrap();
        assert_eq!(config.record_concurrency, 32);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_renderers: 3\nscroll:\n  iterations: 10").unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_renderers, 3);
        assert_eq!(config.scroll.iterations, 10);
        assert_eq!(config.scroll.delay_ms, 500);
        assert_eq!(config.selectors.link_attr, "data-href");
    }

    #[test]
    fn test_zero_caps_are_clamped() {
        let config = PipelineConfig::default().with_overrides(Some(0), Some(0));
        assert_eq!(config.max_renderers, 1);
        assert_eq!(config.record_concurrency, 1);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/harvest.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_default_selectors_compile() {
        let selectors = SelectorConfig::default().compile().unwrap();
        assert_eq!(selectors.link_attr, "data-href");
    }

    #[test]
    fn test_invalid_selector_is_named() {
        let selectors = SelectorConfig {
            title: "h2[".to_string(),
            ..SelectorConfig::default()
        };
        match selectors.compile() {
            Err(ConfigError::Selector { name, .. }) => assert_eq!(name, "title"),
            other => panic!("expected selector error, got {other:?}"),
        }
    }

    #[test]
    fn test_seed_urls_get_suffix() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"link_text": "Rust", "link_url": "https://medium.com/tag/rust"}},
               {{"link_text": "Go", "link_url": "https://medium.com/tag/go/"}}]"#
        )
        .unwrap();

        let urls = load_seed_urls(file.path(), &PipelineConfig::default()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://medium.com/tag/rust/latest".to_string(),
                "https://medium.com/tag/go/latest".to_string(),
            ]
        );
    }

    #[test]
    fn test_malformed_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"link_text": "no url"}}]"#).unwrap();
        let err = load_seed_urls(file.path(), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Seeds(_)));
    }
}
