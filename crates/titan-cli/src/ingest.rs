//! Command handlers that drive the ingestion pipeline.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use titan_core::AppConfig;
use titan_pipeline::{IngestContext, WorkerConfig};
use titan_scraper::{NewsClient, SourceRegistry};
use tokio::sync::watch;

/// Runs one dispatch pass and prints its counts.
///
/// # Errors
///
/// Returns an error if the page client cannot be built. Per-source and
/// per-link failures are logged and counted, not propagated.
pub(crate) async fn run_dispatch(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let client = NewsClient::from_app_config(config)?;
    let registry = SourceRegistry::default();

    let report = titan_pipeline::dispatch(
        pool,
        &client,
        &registry,
        Duration::from_millis(config.dispatch_source_delay_ms),
    )
    .await;

    println!(
        "discovered {} link(s), queued {}, failed {}",
        report.discovered, report.dispatched, report.failed
    );
    Ok(())
}

/// Runs the worker pool until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if a model server is unreachable at startup.
pub(crate) async fn run_worker(
    pool: PgPool,
    config: &AppConfig,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let ctx = Arc::new(IngestContext::from_app_config(pool, config).await?);

    let mut worker_config = WorkerConfig::from_app_config(config);
    if let Some(n) = concurrency {
        anyhow::ensure!(n > 0, "--concurrency must be at least 1");
        worker_config.concurrency = n;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        // Receivers may already be gone if every worker exited.
        let _ = shutdown_tx.send(true);
    });

    titan_pipeline::run_workers(ctx, worker_config, shutdown_rx).await;
    Ok(())
}

/// Ingests one article inline and prints the outcome.
///
/// # Errors
///
/// Returns an error if the shared resources cannot be built. The ingestion
/// itself reports through its outcome.
pub(crate) async fn run_ingest(
    pool: PgPool,
    config: &AppConfig,
    title: &str,
    url: &str,
) -> anyhow::Result<()> {
    let ctx = IngestContext::from_app_config(pool, config).await?;
    let outcome = titan_pipeline::ingest_article(&ctx, title, url).await;
    println!("{url}: {outcome}");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing in-flight jobs");
}
