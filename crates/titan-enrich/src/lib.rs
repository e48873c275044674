//! Sentiment classification and sentence embeddings for article bodies.
//!
//! Both models run behind Text Embeddings Inference (TEI) servers: a
//! sequence-classification model for the sentiment label and a sentence
//! transformer whose token states are mean-pooled into a 384-dimension vector.

mod enricher;
pub mod error;
mod tei;

pub use enricher::{EnrichConfig, Enricher, Enrichment, EMBED_TOKEN_WINDOW};
pub use error::EnrichError;
