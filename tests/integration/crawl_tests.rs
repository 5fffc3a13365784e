//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against a temporary landing zone.

use landing_crawler::config::{
    default_blocklist, Config, CrawlerConfig, FetcherConfig, LandingZoneConfig, TransformConfig,
};
use landing_crawler::crawler::{Coordinator, Launcher, RootOutcome, WorkerPool};
use landing_crawler::output::{ExtractionReport, StatsSink};
use landing_crawler::storage::{acquire_lock, CleanedContent, ContentKind, Journal, JOURNAL_FILE};
use landing_crawler::url::hash_url;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a landing zone inside `dir`
fn create_test_config(dir: &TempDir, roots: Vec<String>, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            workers: 2,
            resume: false,
            roots,
            blocklist: default_blocklist(),
        },
        fetcher: FetcherConfig {
            max_attempts: 3,
            backoff_factor: 0.0, // No waiting between attempts
            timeout_secs: 5,
            ..FetcherConfig::default()
        },
        landing_zone: LandingZoneConfig::new(dir.path().to_string_lossy().to_string()),
        transform: TransformConfig::default(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>t</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn journal_for(config: &Config) -> Journal {
    Journal::open(&config.landing_zone).expect("Failed to open journal")
}

#[tokio::test]
async fn test_crawl_follows_links_and_filters_social() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/x">x</a>
               <a href="https://www.facebook.com/a">social</a>
               <a href="mailto:someone@example.com">mail</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html(r#"<a href="/deep">deeper</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Beyond max depth
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html("nothing"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 1);
    let coordinator = Coordinator::new(Arc::new(config.clone())).unwrap();

    let summary = coordinator.crawl(&root).await.unwrap();
    assert_eq!(summary.visited, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.journal_failures, 0);

    let records = journal_for(&config).load().unwrap();
    assert_eq!(records.len(), 2);

    let x_url = format!("{}/x", mock_server.uri());
    assert_eq!(records[0].url, root);
    assert_eq!(records[1].url, x_url);
    for record in &records {
        assert!(record.status);
        assert_eq!(record.content_type, Some(ContentKind::Webpage));
        assert_eq!(record.hash_url, hash_url(&record.url));

        let artifact = record.path.as_ref().expect("successful fetch has a path");
        assert!(artifact.ends_with(&format!("{}.html", record.hash_url)));
        assert!(std::path::Path::new(artifact).is_file());
    }
}

#[tokio::test]
async fn test_resume_skips_journaled_urls() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/x">x</a>"#))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html("leaf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 2);
    Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();
    let first = journal_for(&config).load().unwrap();

    let mut resumed = config.clone();
    resumed.crawler.resume = true;
    let summary = Coordinator::new(Arc::new(resumed))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    // Only the root is fetched again
    assert_eq!(summary.visited, 1);
    assert_eq!(journal_for(&config).load().unwrap(), first);
}

#[tokio::test]
async fn test_retry_then_success() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("finally"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 0);
    let summary = Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    let records = journal_for(&config).load().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].status);
}

#[tokio::test]
async fn test_retries_exhausted_records_failure() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 1);
    let summary = Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    let records = journal_for(&config).load().unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].status);
    assert_eq!(records[0].content_type, None);
    assert_eq!(records[0].path, None);
}

#[tokio::test]
async fn test_pdf_is_stored_and_not_followed() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());
    let pdf_url = format!("{}/paper.pdf", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/paper.pdf">paper</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4 test".to_vec(), "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 3);
    Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    let journal = journal_for(&config);
    let pdfs = journal.pdf_records().unwrap();
    assert_eq!(pdfs.len(), 1);
    assert_eq!(pdfs[0].url, pdf_url);

    let stored = config
        .landing_zone
        .documents_path()
        .join(format!("{}.pdf", hash_url(&pdf_url)));
    assert_eq!(std::fs::read(stored).unwrap(), b"%PDF-1.4 test");
}

#[tokio::test]
async fn test_unsupported_content_type_is_a_leaf() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/logo.png">logo</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![root.clone()], 2);
    let summary = Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.failed, 1);

    let records = journal_for(&config).load().unwrap();
    let logo = records
        .iter()
        .find(|r| r.url.ends_with("/logo.png"))
        .expect("logo recorded");
    assert!(!logo.status);
    assert_eq!(logo.content_type, None);
}

#[tokio::test]
async fn test_cleaned_content_and_report() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());
    let x_url = format!("{}/x", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>Welcome</p><a href="/x">more</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html("<p>Details</p><script>var hidden = 1;</script>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![root.clone()], 1);
    config.landing_zone.content_dir = Some("content".to_string());
    config.landing_zone.report_dir = Some("reports".to_string());

    let stats = Arc::new(StatsSink::new());
    Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .with_metrics(stats.clone())
        .crawl(&root)
        .await
        .unwrap();

    assert_eq!(StatsSink::get(&stats.webpages), 2);
    assert_eq!(StatsSink::get(&stats.persisted), 2);

    let content_dir = config.landing_zone.content_path().unwrap();
    let read_content = |url: &str| -> CleanedContent {
        let raw = std::fs::read(content_dir.join(format!("{}.json", hash_url(url)))).unwrap();
        serde_json::from_slice(&raw).unwrap()
    };

    let root_content = read_content(&root);
    assert_eq!(root_content.parent_url, "");
    assert_eq!(root_content.hash_parent_url, hash_url(""));

    let x_content = read_content(&x_url);
    assert_eq!(x_content.parent_url, root);
    assert!(x_content.content.contains("Details"));
    assert!(!x_content.content.contains("hidden"));

    let report = ExtractionReport::new(
        &config.landing_zone.report_path().unwrap(),
        config.landing_zone.lock_timeout(),
    );
    let entries = report.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].root_url, root);
    assert_eq!(entries[0].total, 2);
    assert_eq!(entries[0].number_of_htmls, 2);
}

#[tokio::test]
async fn test_in_process_pool_crawls_every_root() {
    let mock_server = MockServer::start().await;
    let first = format!("{}/a/", mock_server.uri());
    let second = format!("{}/b/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/a/"))
        .respond_with(html(r#"<a href="shared">shared</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b/"))
        .respond_with(html("no links"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a/shared"))
        .respond_with(html("leaf"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![first.clone(), second.clone()], 1);
    let coordinator = Coordinator::new(Arc::new(config.clone())).unwrap();
    let pool = WorkerPool::new(
        config.crawler.workers,
        Launcher::InProcess(Arc::new(coordinator)),
    );

    let report = pool.crawl_many(&config.crawler.roots).await;
    assert!(report.is_success());
    assert_eq!(report.roots.len(), 2);
    assert_eq!(report.roots[0].root_url, first);
    assert_eq!(report.roots[1].root_url, second);
    assert!(matches!(
        &report.roots[0].outcome,
        RootOutcome::Completed(summary) if summary.visited == 2
    ));

    let visited = journal_for(&config).visited_urls().unwrap();
    assert_eq!(visited.len(), 3);
    assert!(visited.contains(&format!("{}/a/shared", mock_server.uri())));
}

#[tokio::test]
async fn test_declared_charset_is_used_for_cleaned_text() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><p>caff\xe8 citt\xe0</p></body></html>".to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![root.clone()], 0);
    config.landing_zone.content_dir = Some("content".to_string());

    Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .crawl(&root)
        .await
        .unwrap();

    let content_file = config
        .landing_zone
        .content_path()
        .unwrap()
        .join(format!("{}.json", hash_url(&root)));
    let content: CleanedContent =
        serde_json::from_slice(&std::fs::read(content_file).unwrap()).unwrap();
    assert_eq!(content.content, "caff\u{e8} citt\u{e0}");

    // The stored page keeps the bytes as served
    let html_file = config
        .landing_zone
        .html_path()
        .join(format!("{}.html", hash_url(&root)));
    let raw = std::fs::read(html_file).unwrap();
    assert!(raw.windows(5).any(|w| w == b"caff\xe8"));
}

#[tokio::test]
async fn test_journal_lock_timeout_is_counted_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/x">x</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html("leaf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![root.clone()], 1);
    config.landing_zone.lock_timeout_ms = 100;

    let stats = Arc::new(StatsSink::new());
    let coordinator = Coordinator::new(Arc::new(config.clone()))
        .unwrap()
        .with_metrics(stats.clone());

    // Another writer holds the journal for the whole crawl
    let metadata = config.landing_zone.metadata_path();
    let _held = acquire_lock(
        &metadata.join(format!("{}.lock", JOURNAL_FILE)),
        Duration::from_secs(1),
    )
    .unwrap();

    let summary = coordinator.crawl(&root).await.unwrap();

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.journal_failures, 2);
    assert_eq!(StatsSink::get(&stats.persist_failures), 2);
    assert_eq!(StatsSink::get(&stats.persisted), 0);
    assert!(!metadata.join(JOURNAL_FILE).exists());
}

#[tokio::test]
async fn test_process_launcher_runs_worker_binary() {
    let mock_server = MockServer::start().await;
    let root = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/x">x</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html("leaf"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let zone = dir.path().join("zone");
    let config_path = dir.path().join("crawl.toml");
    let toml = format!(
        r#"[crawler]
max-depth = 1
workers = 1
roots = [{root:?}]

[fetcher]
max-attempts = 1
backoff-factor = 0.0

[landing-zone]
path = {zone:?}
"#,
        root = root,
        zone = zone.to_string_lossy(),
    );
    std::fs::write(&config_path, toml).unwrap();

    let launcher = Launcher::Process {
        program: PathBuf::from(env!("CARGO_BIN_EXE_landing-crawler")),
        config_path,
        resume: false,
        verbose: 0,
        quiet: true,
    };
    let report = WorkerPool::new(1, launcher)
        .crawl_many(std::slice::from_ref(&root))
        .await;

    assert!(report.is_success(), "{:?}", report);
    match &report.roots[0].outcome {
        RootOutcome::Completed(summary) => {
            assert_eq!(summary.root_url, root);
            assert_eq!(summary.visited, 2);
            assert_ne!(summary.worker_id, std::process::id());
        }
        other => panic!("expected a completed root, got {:?}", other),
    }

    let journal = Journal::new(&zone.join("metadata"), Duration::from_secs(2));
    assert_eq!(journal.load().unwrap().len(), 2);
}
