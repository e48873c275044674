//! Article ingestion: the per-article task, the dispatch pass that feeds the
//! queue, and the worker pool that drains it.

mod dispatch;
pub mod error;
mod ingest;
mod worker;

pub use dispatch::{dispatch, DispatchReport};
pub use error::PipelineError;
pub use ingest::{ingest_article, IngestContext, IngestOutcome};
pub use worker::{process_next_job, run_workers, ProcessedJob, WorkerConfig};
