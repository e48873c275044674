//! Shared domain types and environment configuration for Titan.

mod app_config;
mod articles;
mod config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use articles::{
    Extraction, LinkCandidate, EMBEDDING_DIM, LINKS_PER_SOURCE, RECENT_LIMIT,
    SENTIMENT_CHAR_LIMIT, SIMILAR_LIMIT,
};
pub use config::{load_app_config, load_app_config_from_env, MAX_VISIBILITY_TIMEOUT_SECS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
