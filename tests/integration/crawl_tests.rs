//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the engine
//! through the real `HttpFetcher` and an SQLite store.

use crawlkeep::config::{Config, HttpConfig};
use crawlkeep::crawler::{crawl, CrawlEngine, HttpFetcher};
use crawlkeep::state::{EngineState, ItemOutcome};
use crawlkeep::storage::{open_storage, PageStore, SqliteStorage, WorkQueue};
use crawlkeep::url::validate_seed_url;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn engine_for(
    storage: SqliteStorage,
    seed_url: &str,
) -> CrawlEngine<SqliteStorage, HttpFetcher> {
    let fetcher = HttpFetcher::new(&HttpConfig::default()).expect("Failed to build fetcher");
    CrawlEngine::new(
        storage,
        fetcher,
        seed_url,
        Duration::ZERO,
        CancellationToken::new(),
    )
}

/// Paths the mock server has been asked for, in order
async fn requested_paths(mock_server: &MockServer) -> Vec<String> {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_page_with_links_is_saved_and_links_queued() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(format!(
            r#"<html><head><title>Start</title>
            <meta name="description" content="The first page"></head><body>
            <p>tomatoes gardening gardening</p>
            <a href="{base_url}/b">B</a>
            <a href="{base_url}/c">C</a>
            <a href="javascript:void(0)">nothing</a>
            </body></html>"#
        )))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/a", base_url);
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, &seed);

    let outcome = engine.step().await.expect("Step failed");
    assert_eq!(outcome, Some(ItemOutcome::Saved { links_enqueued: 2 }));

    let mut storage = engine.into_storage();
    assert_eq!(storage.count_items().unwrap(), 3);
    assert_eq!(storage.count_pending().unwrap(), 2);

    let pages = storage.all().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "Start");
    assert_eq!(pages[0].description.as_deref(), Some("The first page"));
    assert_eq!(pages[0].top_words[0].word, "gardening");
    assert_eq!(pages[0].top_words[0].count, 2);

    let seed_item = storage.get_item(pages[0].url_id).unwrap().unwrap();
    assert_eq!(seed_item.url, seed);
    assert!(seed_item.done);

    let child = storage.next(None).unwrap();
    assert_eq!(child.url, format!("{}/b", base_url));
    assert_eq!(child.parent_id, Some(seed_item.id));
}

#[tokio::test]
async fn test_not_found_seed_is_retired() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/missing", mock_server.uri());
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, &seed);

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.not_found, 1);
    assert_eq!(report.pages_saved, 0);
    assert_eq!(engine.state(), EngineState::Stopped);

    let storage = engine.storage();
    assert_eq!(storage.count_items().unwrap(), 1);
    assert_eq!(storage.count_done().unwrap(), 1);
    assert_eq!(storage.count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_full_crawl_follows_links_until_queue_empty() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{base_url}/page1">Page 1</a>
            <a href="{base_url}/page2">Page 2</a>
            </body></html>"#
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(format!(
            r#"<html><head><title>Page 1</title></head><body>
            <a href="{base_url}/">Home</a>
            <a href="{base_url}/page2">Page 2</a>
            </body></html>"#
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            "<html><head><title>Page 2</title></head><body>Leaf</body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", base_url);
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, &seed);

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.pages_saved, 3);
    assert_eq!(report.iterations, 3);

    let storage = engine.storage();
    assert_eq!(storage.count_items().unwrap(), 3);
    assert_eq!(storage.count_pending().unwrap(), 0);

    let mut titles: Vec<String> = storage
        .all()
        .unwrap()
        .into_iter()
        .map(|page| page.title)
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);

    // Each URL is fetched exactly once
    let mut paths = requested_paths(&mock_server).await;
    paths.sort();
    assert_eq!(paths, vec!["/", "/page1", "/page2"]);
}

#[tokio::test]
async fn test_rate_limited_item_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(html(
            "<html><head><title>Finally</title></head><body></body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/busy", mock_server.uri());
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, &seed);

    let first = engine.step().await.expect("Step failed");
    assert_eq!(first, Some(ItemOutcome::RateLimited));
    assert_eq!(engine.storage().count_pending().unwrap(), 1);

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.rate_limited, 1);
    assert_eq!(report.pages_saved, 1);
    assert_eq!(engine.storage().count_items().unwrap(), 1);
    assert_eq!(engine.storage().count_done().unwrap(), 1);
    assert_eq!(requested_paths(&mock_server).await, vec!["/busy", "/busy"]);
}

#[tokio::test]
async fn test_server_error_retires_item() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/broken", mock_server.uri());
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, &seed);

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.failed, 1);
    assert_eq!(engine.storage().count_done().unwrap(), 1);
    assert_eq!(engine.backoff().current(), engine.backoff().initial());
}

#[tokio::test]
async fn test_crawl_resumes_from_existing_database() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(html(format!(
            r#"<html><head><title>Start</title></head><body>
            <a href="{base_url}/next">Next</a>
            </body></html>"#
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html(
            "<html><head><title>Next</title></head><body></body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("resume.sqlite3");

    // First session visits only the seed, as if interrupted afterwards
    {
        let storage = open_storage(&db_path).expect("Failed to open storage");
        let mut engine = engine_for(storage, &format!("{}/start", base_url));
        engine.step().await.expect("Step failed");
    }

    // Second session is given a different seed, which must be ignored while
    // the stored queue still has work
    let storage = open_storage(&db_path).expect("Failed to reopen storage");
    let mut engine = engine_for(storage, &format!("{}/elsewhere", base_url));
    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.pages_saved, 1);
    assert_eq!(engine.storage().count_pages().unwrap(), 2);
    assert_eq!(engine.storage().count_pending().unwrap(), 0);
    assert_eq!(requested_paths(&mock_server).await, vec!["/start", "/next"]);
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            "<html><head><title>Only page</title></head><body>Welcome visitors</body></html>"
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.crawler.sleep_time = 0.0;
    config.storage.directory = temp_dir.path().to_path_buf();
    let db_path = config.storage.database_path("entry");

    let report = crawl(
        &config,
        &format!("{}/", mock_server.uri()),
        &db_path,
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.pages_saved, 1);
    assert!(db_path.exists());

    let storage = open_storage(&db_path).expect("Failed to reopen storage");
    let pages = storage.all().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "Only page");
    assert_eq!(pages[0].top_words[0].word, "Welcome");
}

#[tokio::test]
async fn test_cancelled_crawl_makes_no_requests() {
    let mock_server = MockServer::start().await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let fetcher = HttpFetcher::new(&HttpConfig::default()).expect("Failed to build fetcher");
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = CrawlEngine::new(
        storage,
        fetcher,
        format!("{}/", mock_server.uri()),
        Duration::ZERO,
        cancel,
    );

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.iterations, 0);
    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(requested_paths(&mock_server).await.is_empty());
}

#[tokio::test]
async fn test_seed_is_stored_as_typed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The page links back to the seed exactly as it was typed
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{base_url}">Home again</a>
            </body></html>"#
        )))
        .mount(&mock_server)
        .await;

    // No trailing slash; a parsed URL would gain one
    let raw_seed = base_url.clone();
    let seed = validate_seed_url(&raw_seed).expect("Seed should be valid");
    assert_eq!(seed, raw_seed);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.crawler.sleep_time = 0.0;
    let db_path = temp_dir.path().join("literal.sqlite3");

    let report = crawl(&config, seed, &db_path, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.links_enqueued, 0);

    let storage = open_storage(&db_path).expect("Failed to reopen storage");
    assert_eq!(storage.count_items().unwrap(), 1);
    let item = storage.get_item(1).unwrap().expect("Seed item missing");
    assert_eq!(item.url, raw_seed);
    assert_eq!(requested_paths(&mock_server).await, vec!["/"]);
}

#[tokio::test]
async fn test_unreachable_seed_is_retired() {
    // Nothing listens on port 9 locally, so the request fails before any response
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut engine = engine_for(storage, "http://127.0.0.1:9/");

    let report = engine.run().await.expect("Crawl failed");

    assert_eq!(report.failed, 1);
    assert_eq!(engine.storage().count_items().unwrap(), 1);
    assert_eq!(engine.storage().count_done().unwrap(), 1);
    assert_eq!(engine.storage().count_pages().unwrap(), 0);
}
