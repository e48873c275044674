//! Queue consumers.
//!
//! Each worker task loops: claim a job, run [`ingest_article`], record the
//! outcome. When the queue is empty it sleeps for the poll interval. A
//! shutdown signal stops new claims; a job already claimed is finished first.

use std::sync::Arc;
use std::time::Duration;

use titan_core::{AppConfig, MAX_VISIBILITY_TIMEOUT_SECS};
use titan_db::DbError;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::ingest::{ingest_article, IngestContext, IngestOutcome};

#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub visibility_timeout_secs: i64,
}

impl WorkerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            concurrency: config.worker_concurrency,
            poll_interval: Duration::from_millis(config.worker_poll_interval_ms),
            visibility_timeout_secs: visibility_timeout_secs(config.worker_visibility_timeout_secs),
        }
    }
}

/// Clamps to the range `build_app_config` accepts so the claim interval
/// always fits in Postgres.
fn visibility_timeout_secs(secs: u64) -> i64 {
    let secs = secs.clamp(1, MAX_VISIBILITY_TIMEOUT_SECS);
    i64::try_from(secs).unwrap_or(600)
}

/// A job taken off the queue and run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedJob {
    pub job_id: i64,
    pub outcome: IngestOutcome,
}

/// Claims and runs at most one job.
///
/// Returns `Ok(None)` when nothing is claimable.
///
/// # Errors
///
/// Returns [`DbError`] if claiming the job or recording its outcome fails.
/// Ingestion failures are not errors; they are recorded as the outcome.
pub async fn process_next_job(
    ctx: &IngestContext,
    visibility_timeout_secs: i64,
) -> Result<Option<ProcessedJob>, DbError> {
    let Some(job) = titan_db::claim_next_job(&ctx.pool, visibility_timeout_secs).await? else {
        return Ok(None);
    };

    if job.attempts > 1 {
        tracing::info!(job_id = job.id, attempts = job.attempts, url = %job.url, "reclaimed stale ingest job");
    }

    let outcome = ingest_article(ctx, &job.title, &job.url).await;
    titan_db::complete_job(&ctx.pool, job.id, outcome.label(), outcome.error_message()).await?;

    tracing::debug!(job_id = job.id, outcome = outcome.label(), "ingest job done");
    Ok(Some(ProcessedJob {
        job_id: job.id,
        outcome,
    }))
}

/// Runs `config.concurrency` worker tasks until `shutdown` turns `true` or
/// its sender is dropped, then waits for all of them to stop.
pub async fn run_workers(
    ctx: Arc<IngestContext>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
) {
    let concurrency = config.concurrency.max(1);
    tracing::info!(concurrency, "starting ingest workers");

    let mut tasks = JoinSet::new();
    for worker_id in 0..concurrency {
        tasks.spawn(worker_loop(
            worker_id,
            Arc::clone(&ctx),
            config,
            shutdown.clone(),
        ));
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "ingest worker task aborted");
        }
    }
    tracing::info!("all ingest workers stopped");
}

async fn worker_loop(
    worker_id: usize,
    ctx: Arc<IngestContext>,
    config: WorkerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!(worker_id, "ingest worker started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match process_next_job(&ctx, config.visibility_timeout_secs).await {
            // Keep draining while there is work.
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(worker_id, error = %e, "failed to process ingest job");
            }
        }

        tokio::select! {
            () = tokio::time::sleep(config.poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(worker_id, "ingest worker stopped");
}
