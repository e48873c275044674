mod ingest;
mod jobs;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "titan")]
#[command(about = "Titan news ingestion command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan every source homepage once and queue its article links
    Dispatch,
    /// Drain the ingest queue until interrupted
    Worker {
        /// Number of concurrent worker tasks (overrides TITAN_WORKER_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Ingest a single article inline and print the outcome
    Ingest {
        /// Headline to store with the article
        #[arg(long)]
        title: String,
        /// Absolute article URL
        #[arg(long)]
        url: String,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Show ingest queue counts by status and outcome
    Jobs,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("titan: no command given; run `titan --help` for usage");
        return Ok(());
    };

    let config = titan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = titan_db::PoolConfig::from_app_config(&config);
    let pool = titan_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Dispatch => ingest::run_dispatch(&pool, &config).await?,
        Commands::Worker { concurrency } => {
            ingest::run_worker(pool, &config, concurrency).await?;
        }
        Commands::Ingest { title, url } => ingest::run_ingest(pool, &config, &title, &url).await?,
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = titan_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Ping => {
                titan_db::health_check(&pool).await?;
                println!("database ok");
            }
        },
        Commands::Jobs => jobs::print_job_counts(&pool).await?,
    }

    Ok(())
}
