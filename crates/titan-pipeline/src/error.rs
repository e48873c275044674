use thiserror::Error;

/// Failure to assemble the shared ingestion resources.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("scraper setup failed: {0}")]
    Scraper(#[from] titan_scraper::ScraperError),

    #[error("inference setup failed: {0}")]
    Enrich(#[from] titan_enrich::EnrichError),
}
