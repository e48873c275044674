use std::time::Duration;

use sqlx::PgPool;
use titan_core::LinkCandidate;
use titan_scraper::{NewsClient, SourceRegistry};

/// Counts from one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Candidates found across all source homepages.
    pub discovered: usize,
    /// Candidates written to the queue.
    pub dispatched: usize,
    /// Candidates whose enqueue failed.
    pub failed: usize,
}

/// Runs every source's link discovery in registry order and queues one
/// ingestion job per candidate.
///
/// Sources are visited one at a time with `source_delay` between them. A
/// source whose homepage cannot be read contributes nothing. Jobs are only
/// enqueued, never awaited, and the same URL may be queued more than once;
/// the ingestion task absorbs repeats.
pub async fn dispatch(
    pool: &PgPool,
    client: &NewsClient,
    registry: &SourceRegistry,
    source_delay: Duration,
) -> DispatchReport {
    let mut candidates: Vec<LinkCandidate> = Vec::new();

    for (idx, source) in registry.sources().iter().enumerate() {
        if idx > 0 && !source_delay.is_zero() {
            tokio::time::sleep(source_delay).await;
        }
        candidates.extend(client.find_links(source.as_ref()).await);
    }

    let mut report = DispatchReport {
        discovered: candidates.len(),
        ..DispatchReport::default()
    };

    for candidate in &candidates {
        match titan_db::enqueue_ingest_job(pool, &candidate.title, &candidate.url).await {
            Ok(job_id) => {
                tracing::debug!(job_id, url = %candidate.url, "queued ingest job");
                report.dispatched += 1;
            }
            Err(e) => {
                tracing::warn!(url = %candidate.url, error = %e, "failed to queue ingest job");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        discovered = report.discovered,
        dispatched = report.dispatched,
        failed = report.failed,
        "dispatch pass complete"
    );
    report
}
