use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Pause between consecutive sources during a dispatch pass.
    pub dispatch_source_delay_ms: u64,
    /// Base URL of the TEI server hosting the sentence-embedding model.
    pub embed_url: String,
    /// Base URL of the TEI server hosting the sentiment classifier.
    pub classify_url: String,
    pub inference_timeout_secs: u64,
    pub worker_concurrency: usize,
    pub worker_poll_interval_ms: u64,
    /// A job held in `running` longer than this is handed out again.
    pub worker_visibility_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("dispatch_source_delay_ms", &self.dispatch_source_delay_ms)
            .field("embed_url", &self.embed_url)
            .field("classify_url", &self.classify_url)
            .field("inference_timeout_secs", &self.inference_timeout_secs)
            .field("worker_concurrency", &self.worker_concurrency)
            .field("worker_poll_interval_ms", &self.worker_poll_interval_ms)
            .field(
                "worker_visibility_timeout_secs",
                &self.worker_visibility_timeout_secs,
            )
            .finish()
    }
}
