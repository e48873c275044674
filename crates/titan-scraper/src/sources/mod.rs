//! Per-site selector rules and the registry that maps URLs to them.

mod apnews;
mod bbc;
mod guardian;
mod npr;
mod techcrunch;

use std::sync::Arc;

use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate};

pub use apnews::ApNews;
pub use bbc::Bbc;
pub use guardian::Guardian;
pub use npr::Npr;
pub use techcrunch::TechCrunch;

/// One news site: where its homepage is and how to read its markup.
///
/// Implementations only parse; fetching and network-failure handling live in
/// [`crate::NewsClient`].
pub trait NewsSource: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &str;

    /// Host fragment identifying this site's article URLs, e.g. `bbc.com`.
    fn domain(&self) -> &str;

    /// Absolute URL of the page scanned for headlines.
    fn homepage(&self) -> &str;

    /// Headline candidates in page order. `base` is the URL the page was
    /// fetched from and is used to resolve relative links.
    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate>;

    /// Body paragraphs and publication date of an article page.
    fn parse_article(&self, document: &Html) -> Extraction;
}

/// Ordered set of sources. Dispatch walks them in order and URL lookup
/// returns the first whose domain matches.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn NewsSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn NewsSource>>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn NewsSource>] {
        &self.sources
    }

    /// Finds the source responsible for an article URL.
    ///
    /// Matches when the source's domain is a substring of the URL's host.
    /// Returns `None` for unparseable URLs and unknown hosts.
    #[must_use]
    pub fn for_url(&self, url: &str) -> Option<Arc<dyn NewsSource>> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        self.sources
            .iter()
            .find(|source| host.contains(source.domain()))
            .cloned()
    }
}

impl Default for SourceRegistry {
    /// The five supported sites in dispatch order.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(Bbc),
            Arc::new(ApNews),
            Arc::new(Guardian),
            Arc::new(TechCrunch),
            Arc::new(Npr),
        ])
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.name()))
            .finish()
    }
}
