//! End-to-end ingestion against a throwaway database and mock HTTP servers.
//!
//! A single `MockServer` plays the news site; its host (`127.0.0.1`) is the
//! test source's domain, so article URLs on it resolve through the registry.
//! Two more mock servers play the embedding and sentiment model servers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Url;
use scraper::Html;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use titan_core::{Extraction, LinkCandidate, EMBEDDING_DIM};
use titan_enrich::{EnrichConfig, Enricher};
use titan_pipeline::{
    dispatch, ingest_article, process_next_job, run_workers, IngestContext, IngestOutcome,
    WorkerConfig,
};
use titan_scraper::{Bbc, NewsClient, NewsSource, SourceRegistry};

/// BBC markup served by the mock site.
struct LocalBbc {
    homepage: String,
}

impl NewsSource for LocalBbc {
    fn name(&self) -> &str {
        "local-bbc"
    }

    fn domain(&self) -> &str {
        "127.0.0.1"
    }

    fn homepage(&self) -> &str {
        &self.homepage
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        Bbc.parse_links(document, base)
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        Bbc.parse_article(document)
    }
}

const HOMEPAGE: &str = r#"
    <html><body>
      <a data-testid="internal-link" href="/news/articles/a1"><h2 data-testid="card-headline">Alpha</h2></a>
      <a data-testid="internal-link" href="/news/articles/b2"><h2 data-testid="card-headline">Beta</h2></a>
    </body></html>
"#;

const FULL_ARTICLE: &str = r#"
    <html><body>
      <time class="sc-801dd632-2 IvNnh" datetime="2024-06-01T14:30:00Z"></time>
      <p class="sc-9a00e533-0 hxuGS">Rates held steady.</p>
      <p class="sc-9a00e533-0 hxuGS">Markets rallied.</p>
    </body></html>
"#;

const UNDATED_ARTICLE: &str = r#"
    <html><body>
      <p class="sc-9a00e533-0 hxuGS">No timestamp here.</p>
    </body></html>
"#;

const DATED_EMPTY_ARTICLE: &str = r#"
    <html><body>
      <time class="sc-801dd632-2 IvNnh" datetime="2024-06-01T14:30:00Z"></time>
      <p class="sc-9a00e533-0 hxuGS">   </p>
    </body></html>
"#;

struct Harness {
    site: MockServer,
    // Held so the model servers outlive the test body.
    _embed: MockServer,
    classify: MockServer,
    ctx: IngestContext,
}

impl Harness {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.site.uri())
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn start_model_servers() -> (MockServer, MockServer) {
    let embed = MockServer::start().await;
    let classify = MockServer::start().await;

    for (server, model_id) in [(&embed, "embedder"), (&classify, "classifier")] {
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "model_id": model_id })))
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/embed_all"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([[vec![0.1_f32; EMBEDDING_DIM], vec![0.3_f32; EMBEDDING_DIM]]])),
        )
        .mount(&embed)
        .await;

    (embed, classify)
}

async fn mount_sentiment(classify: &MockServer, status: u16) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!([
            { "label": "POSITIVE", "score": 0.97 },
            { "label": "NEGATIVE", "score": 0.03 }
        ]))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(template)
        .mount(classify)
        .await;
}

async fn harness(pool: PgPool) -> Harness {
    let site = MockServer::start().await;
    mount_page(&site, "/news", HOMEPAGE).await;
    mount_page(&site, "/news/articles/a1", FULL_ARTICLE).await;
    mount_page(&site, "/news/articles/b2", FULL_ARTICLE).await;
    mount_page(&site, "/news/articles/undated", UNDATED_ARTICLE).await;
    mount_page(&site, "/news/articles/empty", DATED_EMPTY_ARTICLE).await;

    let (embed, classify) = start_model_servers().await;
    mount_sentiment(&classify, 200).await;

    let enricher = Enricher::connect(&EnrichConfig {
        embed_url: embed.uri(),
        classify_url: classify.uri(),
        timeout_secs: 5,
    })
    .await
    .expect("mock model servers should be reachable");

    let registry = SourceRegistry::new(vec![Arc::new(LocalBbc {
        homepage: format!("{}/news", site.uri()),
    })]);
    let client = NewsClient::new(5, "titan-test/0.1").expect("failed to build test NewsClient");

    Harness {
        site,
        _embed: embed,
        classify,
        ctx: IngestContext::new(pool, client, Arc::new(enricher), registry),
    }
}

async fn article_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// ingest_article
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_stores_fully_enriched_article(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let url = h.url("/news/articles/a1");

    let outcome = ingest_article(&h.ctx, "Alpha", &url).await;
    assert!(matches!(outcome, IngestOutcome::Stored(_)), "got: {outcome:?}");

    let (title, body, sentiment, has_date, has_embedding): (String, String, String, bool, bool) =
        sqlx::query_as(
            "SELECT title, body_text, sentiment, \
                    publication_date IS NOT NULL, embedding IS NOT NULL \
             FROM articles WHERE url = $1",
        )
        .bind(&url)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(title, "Alpha");
    assert_eq!(body, "Rates held steady.\n\nMarkets rallied.");
    assert_eq!(sentiment, "POSITIVE");
    assert!(has_date);
    assert!(has_embedding);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_twice_keeps_one_row(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let url = h.url("/news/articles/a1");

    let first = ingest_article(&h.ctx, "Alpha", &url).await;
    let second = ingest_article(&h.ctx, "Alpha", &url).await;

    assert!(matches!(first, IngestOutcome::Stored(_)));
    assert_eq!(second, IngestOutcome::Duplicate);
    assert_eq!(article_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_ingest_of_same_url_keeps_one_row(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let url = h.url("/news/articles/a1");

    let (a, b, c) = tokio::join!(
        ingest_article(&h.ctx, "Alpha", &url),
        ingest_article(&h.ctx, "Alpha", &url),
        ingest_article(&h.ctx, "Alpha", &url),
    );

    let outcomes = [a, b, c];
    let stored = outcomes
        .iter()
        .filter(|o| matches!(o, IngestOutcome::Stored(_)))
        .count();
    assert_eq!(stored, 1, "outcomes: {outcomes:?}");
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, IngestOutcome::Stored(_) | IngestOutcome::Duplicate)));
    assert_eq!(article_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_unknown_host_writes_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;

    let outcome = ingest_article(&h.ctx, "Elsewhere", "https://example.org/story").await;

    assert_eq!(outcome, IngestOutcome::NoSource);
    assert_eq!(article_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_without_date_writes_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;

    let outcome = ingest_article(&h.ctx, "Undated", &h.url("/news/articles/undated")).await;

    assert_eq!(
        outcome,
        IngestOutcome::Incomplete {
            missing_body: false,
            missing_date: true
        }
    );
    assert_eq!(article_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_without_body_writes_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;

    let outcome = ingest_article(&h.ctx, "Empty", &h.url("/news/articles/empty")).await;

    assert_eq!(
        outcome,
        IngestOutcome::Incomplete {
            missing_body: true,
            missing_date: false
        }
    );
    assert_eq!(article_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_of_missing_page_writes_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;

    let outcome = ingest_article(&h.ctx, "Gone", &h.url("/news/articles/gone")).await;

    assert_eq!(
        outcome,
        IngestOutcome::Incomplete {
            missing_body: true,
            missing_date: true
        }
    );
    assert_eq!(article_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_with_failing_classifier_writes_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;
    h.classify.reset().await;
    mount_sentiment(&h.classify, 500).await;

    let outcome = ingest_article(&h.ctx, "Alpha", &h.url("/news/articles/a1")).await;

    assert!(
        matches!(outcome, IngestOutcome::EnrichmentFailed(_)),
        "got: {outcome:?}"
    );
    assert_eq!(article_count(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// dispatch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn dispatch_queues_one_job_per_candidate(pool: PgPool) {
    let h = harness(pool.clone()).await;

    let report = dispatch(&pool, &h.ctx.client, &h.ctx.registry, Duration::ZERO).await;

    assert_eq!(report.discovered, 2);
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.failed, 0);

    let urls: Vec<String> =
        sqlx::query_scalar("SELECT url FROM ingest_jobs WHERE status = 'queued' ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        urls,
        vec![h.url("/news/articles/a1"), h.url("/news/articles/b2")]
    );
    assert_eq!(article_count(&pool).await, 0, "dispatch must not ingest inline");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dispatch_with_unreachable_source_queues_nothing(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let registry = SourceRegistry::new(vec![Arc::new(LocalBbc {
        homepage: "http://127.0.0.1:1/news".to_string(),
    })]);

    let report = dispatch(&pool, &h.ctx.client, &registry, Duration::ZERO).await;

    assert_eq!(report, titan_pipeline::DispatchReport::default());
}

#[sqlx::test(migrations = "../../migrations")]
async fn dispatch_continues_past_unreachable_source_after_delay(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let registry = SourceRegistry::new(vec![
        Arc::new(LocalBbc {
            homepage: "http://127.0.0.1:1/news".to_string(),
        }),
        Arc::new(LocalBbc {
            homepage: h.url("/news"),
        }),
    ]);
    let delay = Duration::from_millis(300);

    let started = Instant::now();
    let report = dispatch(&pool, &h.ctx.client, &registry, delay).await;
    let elapsed = started.elapsed();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.failed, 0);
    assert!(elapsed >= delay, "sources were not spaced out: {elapsed:?}");

    let urls: Vec<String> =
        sqlx::query_scalar("SELECT url FROM ingest_jobs WHERE status = 'queued' ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        urls,
        vec![h.url("/news/articles/a1"), h.url("/news/articles/b2")]
    );
}

// ---------------------------------------------------------------------------
// workers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn process_next_job_records_outcome(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let job_id = titan_db::enqueue_ingest_job(&pool, "Alpha", &h.url("/news/articles/a1"))
        .await
        .unwrap();

    let processed = process_next_job(&h.ctx, 600).await.unwrap().unwrap();
    assert_eq!(processed.job_id, job_id);
    assert!(matches!(processed.outcome, IngestOutcome::Stored(_)));

    let job = titan_db::get_ingest_job(&pool, job_id).await.unwrap();
    assert_eq!(job.status, "done");
    assert_eq!(job.outcome.as_deref(), Some("stored"));
    assert!(job.error_message.is_none());

    assert!(process_next_job(&h.ctx, 600).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn process_next_job_records_failure_message(pool: PgPool) {
    let h = harness(pool.clone()).await;
    h.classify.reset().await;
    mount_sentiment(&h.classify, 503).await;
    let job_id = titan_db::enqueue_ingest_job(&pool, "Alpha", &h.url("/news/articles/a1"))
        .await
        .unwrap();

    process_next_job(&h.ctx, 600).await.unwrap().unwrap();

    let job = titan_db::get_ingest_job(&pool, job_id).await.unwrap();
    assert_eq!(job.status, "done");
    assert_eq!(job.outcome.as_deref(), Some("enrichment_failed"));
    assert!(job.error_message.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn workers_drain_queue_and_stop_on_shutdown(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let a1 = h.url("/news/articles/a1");
    let b2 = h.url("/news/articles/b2");
    for (title, url) in [("Alpha", &a1), ("Beta", &b2), ("Alpha again", &a1)] {
        titan_db::enqueue_ingest_job(&pool, title, url).await.unwrap();
    }

    let (tx, rx) = watch::channel(false);
    let ctx = Arc::new(h.ctx.clone());
    let config = WorkerConfig {
        concurrency: 2,
        poll_interval: Duration::from_millis(20),
        visibility_timeout_secs: 600,
    };
    let handle = tokio::spawn(run_workers(ctx, config, rx));

    let drained = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let open: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM ingest_jobs WHERE status <> 'done'",
            )
            .fetch_one(&pool)
            .await
            .unwrap();
            if open == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "workers did not drain the queue in time");

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("workers did not stop after shutdown")
        .unwrap();

    assert_eq!(article_count(&pool).await, 2);
}
