//! HTTP side of scraping: fetch a page, hand it to a source's parser, and
//! swallow network failures into empty results.

use std::time::Duration;

use reqwest::{Client, Url};
use scraper::Html;
use titan_core::{AppConfig, Extraction, LinkCandidate, LINKS_PER_SOURCE};

use crate::error::ScraperError;
use crate::sources::NewsSource;

/// Fetches news pages and runs the per-source parsers over them.
///
/// [`find_links`](Self::find_links) and [`extract`](Self::extract) never
/// fail: transport errors and non-2xx statuses are logged at `warn` and
/// produce an empty result, so one unreachable site cannot stall a dispatch
/// pass or crash a worker.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
}

impl NewsClient {
    /// Creates a client with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a client from the scraper settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )
    }

    /// Fetches a page and returns its body as text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx response.
    /// - [`ScraperError::Http`] for network, TLS, or timeout failures.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Reads up to five headline candidates from the source's homepage.
    ///
    /// Returns an empty list if the homepage cannot be fetched.
    pub async fn find_links(&self, source: &dyn NewsSource) -> Vec<LinkCandidate> {
        let homepage = source.homepage();
        let base = match Url::parse(homepage) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!(source = source.name(), url = homepage, error = %e, "invalid homepage URL");
                return Vec::new();
            }
        };

        match self.fetch_html(homepage).await {
            Ok(body) => {
                let links = links_from_page(source, &body, &base);
                tracing::info!(source = source.name(), count = links.len(), "found article links");
                links
            }
            Err(e) => {
                tracing::warn!(source = source.name(), url = homepage, error = %e, "failed to fetch homepage");
                Vec::new()
            }
        }
    }

    /// Fetches an article page and extracts its body and publication date.
    ///
    /// Returns an empty [`Extraction`] if the page cannot be fetched.
    pub async fn extract(&self, source: &dyn NewsSource, url: &str) -> Extraction {
        match self.fetch_html(url).await {
            Ok(body) => article_from_page(source, &body),
            Err(e) => {
                tracing::warn!(source = source.name(), url, error = %e, "failed to fetch article page");
                Extraction::default()
            }
        }
    }
}

// `Html` is not `Send`; parsing stays in these synchronous helpers so it is
// never held across an await point.

fn links_from_page(source: &dyn NewsSource, body: &str, base: &Url) -> Vec<LinkCandidate> {
    let document = Html::parse_document(body);
    let mut links = source.parse_links(&document, base);
    links.truncate(LINKS_PER_SOURCE);
    links
}

fn article_from_page(source: &dyn NewsSource, body: &str) -> Extraction {
    let document = Html::parse_document(body);
    source.parse_article(&document)
}
