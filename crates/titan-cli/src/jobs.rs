use sqlx::PgPool;
use titan_db::JobStatusCount;

/// Prints queue counts grouped by status and outcome.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn print_job_counts(pool: &PgPool) -> anyhow::Result<()> {
    let counts = titan_db::count_jobs_by_status(pool).await?;
    if counts.is_empty() {
        println!("ingest queue is empty");
        return Ok(());
    }

    for line in format_counts(&counts) {
        println!("{line}");
    }
    Ok(())
}

fn format_counts(counts: &[JobStatusCount]) -> Vec<String> {
    let mut lines = vec![format!("{:<10} {:<20} {:>8}", "STATUS", "OUTCOME", "COUNT")];
    lines.extend(counts.iter().map(|c| {
        format!(
            "{:<10} {:<20} {:>8}",
            c.status,
            c.outcome.as_deref().unwrap_or("\u{2014}"),
            c.count
        )
    }));
    lines
}
