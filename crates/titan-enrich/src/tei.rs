//! Thin client for Text Embeddings Inference (TEI) HTTP endpoints.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::EnrichError;

#[derive(Serialize)]
struct InputsRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

/// Subset of `GET /info` we check at startup.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelInfo {
    pub model_id: String,
    /// Token count the server truncates each input to.
    #[serde(default)]
    pub max_input_length: Option<usize>,
}

/// One class score from `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Prediction {
    pub label: String,
    pub score: f32,
}

/// One TEI server.
#[derive(Debug, Clone)]
pub(crate) struct TeiEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl TeiEndpoint {
    pub(crate) fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) async fn info(&self) -> Result<ModelInfo, EnrichError> {
        let url = format!("{}/info", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response, url).await
    }

    /// Class scores for one input, in whatever order the server returns them.
    pub(crate) async fn predict(&self, text: &str) -> Result<Vec<Prediction>, EnrichError> {
        self.post("predict", text).await
    }

    /// Token-level hidden states for one input, one vector per token.
    pub(crate) async fn embed_all(&self, text: &str) -> Result<Vec<Vec<f32>>, EnrichError> {
        let url = format!("{}/embed_all", self.base_url);
        let mut batch: Vec<Vec<Vec<f32>>> = self.post("embed_all", text).await?;
        if batch.is_empty() {
            return Err(EnrichError::EmptyResponse { url });
        }
        Ok(batch.swap_remove(0))
    }

    async fn post<T: DeserializeOwned>(&self, route: &str, text: &str) -> Result<T, EnrichError> {
        let url = format!("{}/{route}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&InputsRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await?;
        Self::decode(response, url).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        url: String,
    ) -> Result<T, EnrichError> {
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }
}
