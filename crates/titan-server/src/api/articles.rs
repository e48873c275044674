use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use titan_core::{RECENT_LIMIT, SIMILAR_LIMIT};
use titan_db::{ArticleRow, SimilarArticleRow, Vector};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ArticleItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub sentiment: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
}

impl From<ArticleRow> for ArticleItem {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            sentiment: row.sentiment,
            publication_date: row.publication_date,
        }
    }
}

impl From<SimilarArticleRow> for ArticleItem {
    fn from(row: SimilarArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            sentiment: row.sentiment,
            publication_date: row.publication_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    pub query: String,
}

pub(super) async fn list_recent_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ArticleItem>>>, ApiError> {
    let rows = titan_db::list_recent_articles(&state.pool, RECENT_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ArticleItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Embeds the query text and returns the five nearest stored articles by L2
/// distance.
pub(super) async fn search_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<ArticleItem>>>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "query must not be empty",
        ));
    }

    let embedding = state.enricher.embed(query).await.map_err(|e| {
        tracing::warn!(error = %e, "query embedding failed");
        ApiError::new(req_id.0.clone(), "upstream_error", "embedding service unavailable")
    })?;

    let rows = titan_db::search_similar_articles(&state.pool, &Vector::from(embedding), SIMILAR_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if rows.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "No similar articles found.",
        ));
    }

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ArticleItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
#[path = "articles_test.rs"]
mod tests;
