//! Database operations for the `articles` table.
//!
//! Rows are written once by the ingestion pipeline and never updated. The
//! `url` column is the only natural key; its unique constraint is what makes
//! concurrent ingestion of the same link collapse to a single row.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `articles` table, without its embedding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub body_text: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub sentiment: Option<String>,
}

/// A similarity search hit with its L2 distance from the query vector.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SimilarArticleRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub sentiment: Option<String>,
    pub distance: f64,
}

/// A fully enriched article ready for its single write.
#[derive(Debug, Clone, Copy)]
pub struct NewArticle<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub body_text: &'a str,
    pub publication_date: DateTime<Utc>,
    pub sentiment: &'a str,
    pub embedding: &'a Vector,
}

/// Result of [`insert_article`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written; carries the store-assigned id.
    Inserted(i64),
    /// Another writer already holds this URL. Nothing was written.
    Duplicate,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Returns `true` if an article with this exact URL is already stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn article_exists(pool: &PgPool, url: &str) -> Result<bool, DbError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM articles WHERE url = $1)")
            .bind(url)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Inserts one article inside its own transaction.
///
/// A unique-constraint violation on `url` means a concurrent task won the
/// race after this caller's existence check. The transaction is rolled back
/// and [`InsertOutcome::Duplicate`] is returned instead of an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] for any failure other than a duplicate URL. The
/// transaction is rolled back before returning.
pub async fn insert_article(
    pool: &PgPool,
    article: &NewArticle<'_>,
) -> Result<InsertOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles \
             (title, url, body_text, publication_date, sentiment, embedding) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(article.title)
    .bind(article.url)
    .bind(article.body_text)
    .bind(article.publication_date)
    .bind(article.sentiment)
    .bind(article.embedding)
    .fetch_one(&mut *tx)
    .await;

    match inserted {
        Ok(id) => {
            tx.commit().await?;
            Ok(InsertOutcome::Inserted(id))
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(url = article.url, error = %rollback_err, "article insert rollback failed");
            }
            let err = DbError::from(e);
            if err.is_unique_violation() {
                Ok(InsertOutcome::Duplicate)
            } else {
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns up to `limit` articles, newest publication date first.
///
/// Rows without a publication date sort last; ties break on `id DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_articles(pool: &PgPool, limit: i64) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, title, url, body_text, publication_date, scraped_at, sentiment \
         FROM articles \
         ORDER BY publication_date DESC NULLS LAST, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` articles closest to `query` by Euclidean distance.
///
/// Articles without an embedding never match. Results are ordered by
/// non-decreasing distance.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including when `query` does
/// not have the column's dimension.
pub async fn search_similar_articles(
    pool: &PgPool,
    query: &Vector,
    limit: i64,
) -> Result<Vec<SimilarArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, SimilarArticleRow>(
        "SELECT id, title, url, publication_date, sentiment, \
                (embedding <-> $1)::float8 AS distance \
         FROM articles \
         WHERE embedding IS NOT NULL \
         ORDER BY embedding <-> $1, id \
         LIMIT $2",
    )
    .bind(query)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
