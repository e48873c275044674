use std::fmt;
use std::sync::Arc;

use sqlx::PgPool;
use titan_core::AppConfig;
use titan_db::{InsertOutcome, NewArticle, Vector};
use titan_enrich::{EnrichConfig, Enricher};
use titan_scraper::{NewsClient, SourceRegistry};

use crate::error::PipelineError;

/// Everything an ingestion task needs, built once per process.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub pool: PgPool,
    pub client: NewsClient,
    pub enricher: Arc<Enricher>,
    pub registry: SourceRegistry,
}

impl IngestContext {
    #[must_use]
    pub fn new(
        pool: PgPool,
        client: NewsClient,
        enricher: Arc<Enricher>,
        registry: SourceRegistry,
    ) -> Self {
        Self {
            pool,
            client,
            enricher,
            registry,
        }
    }

    /// Builds the page client, connects to both model servers, and uses the
    /// default source registry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the HTTP client cannot be built or a
    /// model server is unreachable.
    pub async fn from_app_config(pool: PgPool, config: &AppConfig) -> Result<Self, PipelineError> {
        let client = NewsClient::from_app_config(config)?;
        let enricher = Enricher::connect(&EnrichConfig::from_app_config(config)).await?;
        Ok(Self::new(
            pool,
            client,
            Arc::new(enricher),
            SourceRegistry::default(),
        ))
    }
}

/// How one ingestion attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// No registered source handles the URL's host.
    NoSource,
    /// The page was fetched (or not) but body or date could not be read.
    Incomplete {
        missing_body: bool,
        missing_date: bool,
    },
    /// A model server call failed. Nothing was written.
    EnrichmentFailed(String),
    /// The URL is already stored, either before this attempt or by a
    /// concurrent one that committed first.
    Duplicate,
    /// A new row was written with this id.
    Stored(i64),
    /// The existence check or the insert failed for a reason other than a
    /// duplicate URL.
    PersistenceFailed(String),
}

impl IngestOutcome {
    /// Stable label recorded on the queue row.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::NoSource => "no_source",
            IngestOutcome::Incomplete { .. } => "incomplete",
            IngestOutcome::EnrichmentFailed(_) => "enrichment_failed",
            IngestOutcome::Duplicate => "duplicate",
            IngestOutcome::Stored(_) => "stored",
            IngestOutcome::PersistenceFailed(_) => "persistence_failed",
        }
    }

    /// Error text for the outcomes that carry one.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            IngestOutcome::EnrichmentFailed(msg) | IngestOutcome::PersistenceFailed(msg) => {
                Some(msg)
            }
            _ => None,
        }
    }
}

impl fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestOutcome::Stored(id) => write!(f, "stored (id {id})"),
            IngestOutcome::Incomplete {
                missing_body,
                missing_date,
            } => {
                let missing = match (missing_body, missing_date) {
                    (true, true) => "body and date",
                    (true, false) => "body",
                    _ => "date",
                };
                write!(f, "incomplete (missing {missing})")
            }
            IngestOutcome::EnrichmentFailed(msg) | IngestOutcome::PersistenceFailed(msg) => {
                write!(f, "{}: {msg}", self.label())
            }
            other => f.write_str(other.label()),
        }
    }
}

/// Extracts, enriches, and stores one article.
///
/// Never fails outward: every error path is logged and reported as an
/// [`IngestOutcome`]. At most one row is written, and only once the body,
/// date, sentiment, and embedding are all in hand. Running this twice for
/// the same URL, sequentially or concurrently, leaves a single row.
pub async fn ingest_article(ctx: &IngestContext, title: &str, url: &str) -> IngestOutcome {
    let Some(source) = ctx.registry.for_url(url) else {
        tracing::warn!(url, "no source handles this url; skipping");
        return IngestOutcome::NoSource;
    };

    let extraction = ctx.client.extract(source.as_ref(), url).await;
    if !extraction.is_complete() {
        let outcome = IngestOutcome::Incomplete {
            missing_body: extraction.body.is_none(),
            missing_date: extraction.published_at.is_none(),
        };
        tracing::warn!(source = source.name(), url, %outcome, "extraction incomplete; skipping");
        return outcome;
    }
    // Both halves are present past the gate.
    let body = extraction.body.unwrap_or_default();
    let published_at = extraction.published_at.unwrap_or_default();

    let enrichment = match ctx.enricher.enrich(&body).await {
        Ok(enrichment) => enrichment,
        Err(e) => {
            tracing::error!(source = source.name(), url, error = %e, "enrichment failed");
            return IngestOutcome::EnrichmentFailed(e.to_string());
        }
    };

    match titan_db::article_exists(&ctx.pool, url).await {
        Ok(true) => {
            tracing::info!(url, "article already stored");
            return IngestOutcome::Duplicate;
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(url, error = %e, "article existence check failed");
            return IngestOutcome::PersistenceFailed(e.to_string());
        }
    }

    let embedding = Vector::from(enrichment.embedding);
    let article = NewArticle {
        title,
        url,
        body_text: &body,
        publication_date: published_at,
        sentiment: &enrichment.sentiment,
        embedding: &embedding,
    };

    match titan_db::insert_article(&ctx.pool, &article).await {
        Ok(InsertOutcome::Inserted(id)) => {
            tracing::info!(
                source = source.name(),
                url,
                id,
                sentiment = %enrichment.sentiment,
                "article stored"
            );
            IngestOutcome::Stored(id)
        }
        Ok(InsertOutcome::Duplicate) => {
            tracing::info!(url, "article stored concurrently by another task");
            IngestOutcome::Duplicate
        }
        Err(e) => {
            tracing::error!(url, error = %e, "article insert failed");
            IngestOutcome::PersistenceFailed(e.to_string())
        }
    }
}
