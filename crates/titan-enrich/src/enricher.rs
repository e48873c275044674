use std::time::Duration;

use titan_core::{AppConfig, EMBEDDING_DIM, SENTIMENT_CHAR_LIMIT};

use crate::error::EnrichError;
use crate::tei::TeiEndpoint;

/// Token window article embeddings are expected to cover. Servers reporting
/// a smaller `max_input_length` silently embed only the head of long bodies.
pub const EMBED_TOKEN_WINDOW: usize = 512;

/// Where the two model servers live.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// TEI server hosting `sentence-transformers/all-MiniLM-L6-v2`.
    pub embed_url: String,
    /// TEI server hosting `distilbert-base-uncased-finetuned-sst-2-english`.
    pub classify_url: String,
    pub timeout_secs: u64,
}

impl EnrichConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            embed_url: config.embed_url.clone(),
            classify_url: config.classify_url.clone(),
            timeout_secs: config.inference_timeout_secs,
        }
    }
}

/// Sentiment label and sentence embedding for one article body.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub sentiment: String,
    pub embedding: Vec<f32>,
}

/// Handle to the sentiment and embedding models.
///
/// Built once per process with [`Enricher::connect`], which confirms both
/// model servers are up, then shared read-only (typically behind an `Arc`)
/// by every task that needs inference.
#[derive(Debug)]
pub struct Enricher {
    embedder: TeiEndpoint,
    classifier: TeiEndpoint,
    embed_model: String,
    classify_model: String,
    embed_max_input_length: Option<usize>,
}

impl Enricher {
    /// Checks both model servers and returns a ready handle.
    ///
    /// Logs a warning when the embedding server truncates inputs to fewer
    /// than [`EMBED_TOKEN_WINDOW`] tokens.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError`] if the HTTP client cannot be built or either
    /// server does not answer `GET /info` successfully.
    pub async fn connect(config: &EnrichConfig) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let embedder = TeiEndpoint::new(client.clone(), &config.embed_url);
        let classifier = TeiEndpoint::new(client, &config.classify_url);

        let (embed_info, classify_info) = tokio::try_join!(embedder.info(), classifier.info())?;
        tracing::info!(
            embed_model = %embed_info.model_id,
            classify_model = %classify_info.model_id,
            embed_max_input_length = ?embed_info.max_input_length,
            "inference models ready"
        );
        if let Some(max) = short_token_window(embed_info.max_input_length) {
            tracing::warn!(
                embed_model = %embed_info.model_id,
                max_input_length = max,
                expected = EMBED_TOKEN_WINDOW,
                "embedding server truncates inputs below the expected token window"
            );
        }

        Ok(Self {
            embedder,
            classifier,
            embed_model: embed_info.model_id,
            classify_model: classify_info.model_id,
            embed_max_input_length: embed_info.max_input_length,
        })
    }

    /// Token limit the embedding server reported, if any.
    #[must_use]
    pub fn embed_max_input_length(&self) -> Option<usize> {
        self.embed_max_input_length
    }

    #[must_use]
    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    #[must_use]
    pub fn classify_model(&self) -> &str {
        &self.classify_model
    }

    /// Label of the highest-scoring sentiment class for `text`.
    ///
    /// Only the first 512 characters are classified.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError`] if the request fails or the server returns no
    /// classes.
    pub async fn classify(&self, text: &str) -> Result<String, EnrichError> {
        let snippet = truncate_chars(text, SENTIMENT_CHAR_LIMIT);
        let predictions = self.classifier.predict(snippet).await?;

        predictions
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|p| p.label)
            .ok_or_else(|| EnrichError::EmptyResponse {
                url: "predict".to_string(),
            })
    }

    /// Mean-pooled sentence embedding of `text`.
    ///
    /// The server truncates input to its own `max_input_length` (256 tokens
    /// for `all-MiniLM-L6-v2`), so long bodies are embedded by their head.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::DimensionMismatch`] if the vector is not
    /// 384-dimensional, or another [`EnrichError`] if the request fails.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EnrichError> {
        let tokens = self.embedder.embed_all(text).await?;
        let pooled = mean_pool(&tokens).ok_or_else(|| EnrichError::EmptyResponse {
            url: "embed_all".to_string(),
        })?;

        if pooled.len() != EMBEDDING_DIM {
            return Err(EnrichError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: pooled.len(),
            });
        }
        Ok(pooled)
    }

    /// Classifies and embeds an article body concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first [`EnrichError`] from either model.
    pub async fn enrich(&self, body: &str) -> Result<Enrichment, EnrichError> {
        let (sentiment, embedding) = tokio::try_join!(self.classify(body), self.embed(body))?;
        Ok(Enrichment {
            sentiment,
            embedding,
        })
    }
}

/// The reported limit, when it is below [`EMBED_TOKEN_WINDOW`].
fn short_token_window(max_input_length: Option<usize>) -> Option<usize> {
    max_input_length.filter(|&max| max < EMBED_TOKEN_WINDOW)
}

/// Longest prefix of `text` with at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Component-wise mean of token vectors. `None` when there are no tokens or
/// the tokens disagree on length.
fn mean_pool(tokens: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = tokens.first()?;
    let dim = first.len();
    if dim == 0 || tokens.iter().any(|t| t.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0_f32; dim];
    for token in tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let count = tokens.len() as f32;
    Some(sum.into_iter().map(|v| v / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 512), "short");
        assert_eq!(truncate_chars("", 3), "");
        let long = "ü".repeat(600);
        assert_eq!(truncate_chars(&long, 512).chars().count(), 512);
    }

    #[test]
    fn mean_pool_averages_tokens() {
        let pooled = mean_pool(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(pooled, vec![2.0, 4.0]);
    }

    #[test]
    fn mean_pool_rejects_empty_and_ragged_input() {
        assert!(mean_pool(&[]).is_none());
        assert!(mean_pool(&[vec![]]).is_none());
        assert!(mean_pool(&[vec![1.0, 2.0], vec![1.0]]).is_none());
    }

    #[test]
    fn short_token_window_flags_limits_below_512() {
        assert_eq!(short_token_window(Some(256)), Some(256));
        assert_eq!(short_token_window(Some(511)), Some(511));
        assert_eq!(short_token_window(Some(512)), None);
        assert_eq!(short_token_window(Some(8192)), None);
        assert_eq!(short_token_window(None), None);
    }

    #[test]
    fn enrich_config_reads_app_config() {
        let app = AppConfig {
            database_url: "postgres://example".to_string(),
            env: titan_core::Environment::Test,
            bind_addr: "127.0.0.1:8000".parse().unwrap(),
            log_level: "info".to_string(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            scraper_request_timeout_secs: 30,
            scraper_user_agent: "ua".to_string(),
            dispatch_source_delay_ms: 1000,
            embed_url: "http://embed:80".to_string(),
            classify_url: "http://classify:80".to_string(),
            inference_timeout_secs: 42,
            worker_concurrency: 4,
            worker_poll_interval_ms: 1000,
            worker_visibility_timeout_secs: 600,
        };
        let config = EnrichConfig::from_app_config(&app);
        assert_eq!(config.embed_url, "http://embed:80");
        assert_eq!(config.classify_url, "http://classify:80");
        assert_eq!(config.timeout_secs, 42);
    }
}
