use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dimension of the sentence embedding stored in `articles.embedding`.
pub const EMBEDDING_DIM: usize = 384;

/// Maximum number of candidates a source homepage yields per discovery pass.
pub const LINKS_PER_SOURCE: usize = 5;

/// Row count returned by the recent-articles query.
pub const RECENT_LIMIT: i64 = 10;

/// Row count returned by the similarity query.
pub const SIMILAR_LIMIT: i64 = 5;

/// Characters of body text handed to the sentiment classifier.
pub const SENTIMENT_CHAR_LIMIT: usize = 512;

/// A headline link found on a source homepage, not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub title: String,
    /// Absolute article URL.
    pub url: String,
}

/// Result of pulling an article page apart.
///
/// Either field may be absent: a network failure yields both as `None`, and a
/// page whose markup has drifted away from the selectors yields whichever
/// half still matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Paragraph texts joined with a blank line. Never `Some("")`.
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Extraction {
    /// Builds an extraction from already-trimmed paragraph texts, dropping
    /// empty paragraphs and treating an empty result as no body.
    #[must_use]
    pub fn from_paragraphs<I, S>(paragraphs: I, published_at: Option<DateTime<Utc>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = paragraphs
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim();
                (!p.is_empty()).then(|| p.to_string())
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            body: (!joined.is_empty()).then_some(joined),
            published_at,
        }
    }

    /// Both body and publication date are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.body.is_some() && self.published_at.is_some()
    }
}
