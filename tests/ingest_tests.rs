//! Integration tests for the ingestion engine
//!
//! These tests use wiremock to stand in for the Hacker News API and run the
//! jobs end-to-end against a real SQLite file.

use hn_ingest::config::Config;
use hn_ingest::crawler::{
    BatchFetcher, Coordinator, FetchResult, HttpItemSource, ItemSource, LivePoller, TreeCrawler,
};
use hn_ingest::item::ItemType;
use hn_ingest::storage::{shared, with_store, ItemStore, SharedStore, SqliteStorage};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout_ms = 500;
    config.database.path = db_path.to_string();
    config.backfill.window_size = 5;
    config.backfill.concurrency = 3;
    config.crawl.concurrency = 4;
    config.listener.warmup_secs = 0;
    config.startup.retry_delay_ms = 10;
    config
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("hn.db").to_string_lossy().into_owned()
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, body: Value) {
    let id = body["id"].as_i64().expect("item id");
    mount_json(server, &format!("/v0/item/{}.json", id), body).await;
}

fn http_source(server: &MockServer, timeout_ms: u64) -> HttpItemSource {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout_ms = timeout_ms;
    HttpItemSource::from_config(&config.api).expect("Failed to build source")
}

#[tokio::test]
async fn test_fetch_item_outcomes() {
    let server = MockServer::start().await;

    mount_item(
        &server,
        json!({"id": 1, "type": "story", "score": 10, "time": 1175714200, "title": "Hello"}),
    )
    .await;
    mount_json(&server, "/v0/item/2.json", Value::Null).await;
    Mock::given(method("GET"))
        .and(path("/v0/item/3.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/4.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/5.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 5, "type": "comment"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let source = http_source(&server, 300);

    match source.fetch_item(1).await {
        FetchResult::Item(item) => {
            assert_eq!(item.id, 1);
            assert_eq!(item.title.as_deref(), Some("Hello"));
        }
        other => panic!("expected item, got {:?}", other),
    }
    assert_eq!(source.fetch_item(2).await, FetchResult::Missing);
    assert!(matches!(source.fetch_item(3).await, FetchResult::Failed { .. }));
    assert!(matches!(source.fetch_item(4).await, FetchResult::Failed { .. }));
    assert!(matches!(source.fetch_item(5).await, FetchResult::Failed { .. }));
}

#[tokio::test]
async fn test_list_endpoints() {
    let server = MockServer::start().await;
    mount_json(&server, "/v0/maxitem.json", json!(8863)).await;
    mount_json(&server, "/v0/topstories.json", json!([9, 8, 7])).await;
    mount_json(
        &server,
        "/v0/updates.json",
        json!({"items": [1, 2], "profiles": ["pg"]}),
    )
    .await;

    let source = http_source(&server, 1000);

    assert_eq!(source.fetch_max_item().await.unwrap(), 8863);
    assert_eq!(source.fetch_top_stories().await.unwrap(), vec![9, 8, 7]);
    assert_eq!(source.fetch_updates().await.unwrap().items, vec![1, 2]);
}

#[tokio::test]
async fn test_full_backfill_with_comment_trees() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/v0/maxitem.json", json!(7)).await;

    // Story 1 with a two-level comment tree, a spam story and a job
    mount_item(
        &server,
        json!({"id": 1, "type": "story", "score": 25, "time": 1, "kids": [2, 3], "descendants": 3}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 2, "type": "comment", "parent": 1, "time": 2, "kids": [4]}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 3, "type": "comment", "parent": 1, "time": 3}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 4, "type": "comment", "parent": 2, "time": 4}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 5, "type": "story", "score": 1, "time": 5}),
    )
    .await;
    mount_item(&server, json!({"id": 6, "type": "job", "score": 99, "time": 6})).await;
    mount_json(&server, "/v0/item/7.json", Value::Null).await;

    let config = create_test_config(&server.uri(), &db_path(&dir));
    let coordinator = Coordinator::connect(config).expect("Failed to create coordinator");

    let report = coordinator
        .run_backfill(Some(1), None)
        .await
        .expect("Backfill failed");

    assert_eq!(report.windows, 2);
    assert_eq!(report.stories_saved, 1);
    assert_eq!(report.comments_saved, 3);

    // Reopen the database file to check what was committed
    let storage = SqliteStorage::new(&dir.path().join("hn.db")).expect("Failed to open DB");
    let story = storage.get_item(1).unwrap().expect("story 1 stored");
    assert_eq!(story.kids, vec![2, 3]);
    assert_eq!(story.descendants, 3);
    assert_eq!(storage.get_item(4).unwrap().unwrap().parent, Some(2));
    assert!(storage.get_item(5).unwrap().is_none());
    assert!(storage.get_item(6).unwrap().is_none());
    assert_eq!(storage.count_items(ItemType::Story).unwrap(), 1);
    assert_eq!(storage.count_items(ItemType::Comment).unwrap(), 3);
}

#[tokio::test]
async fn test_backfill_does_not_refetch_stored_items() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_item(
        &server,
        json!({"id": 10, "type": "story", "score": 5, "time": 1, "kids": [11]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/11.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 11, "type": "comment", "parent": 10, "time": 2})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), &db_path(&dir));
    let coordinator = Coordinator::connect(config).unwrap();

    coordinator.run_backfill(Some(10), Some(11)).await.unwrap();
    // Second run finds story 10 stored and never reaches comment 11 again
    let report = coordinator.run_backfill(Some(10), Some(11)).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn test_live_poll_cycle() {
    let server = MockServer::start().await;

    mount_json(
        &server,
        "/v0/updates.json",
        json!({"items": [20, 21, 22], "profiles": []}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 20, "type": "story", "score": 300, "time": 1, "kids": [23]}),
    )
    .await;
    mount_item(
        &server,
        json!({"id": 21, "type": "comment", "parent": 20, "time": 2}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/22.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_item(
        &server,
        json!({"id": 23, "type": "comment", "parent": 20, "time": 3}),
    )
    .await;

    let source: Arc<dyn ItemSource> = Arc::new(http_source(&server, 1000));
    let store: SharedStore = shared(SqliteStorage::open_in_memory().unwrap());
    let fetcher = BatchFetcher::new(source, Duration::from_secs(1));
    let crawler = TreeCrawler::new(store.clone(), fetcher.clone(), 10);
    let config = create_test_config(&server.uri(), ":memory:");
    let poller = LivePoller::new(store.clone(), fetcher, crawler, config.listener);

    let report = poller.poll_once().await.expect("Poll failed");

    assert_eq!(report.updated, 3);
    assert_eq!(report.stories_saved, 1);
    assert_eq!(report.comments_saved, 1);

    with_store(&store, |s| {
        assert!(s.get_item(20)?.is_some());
        assert!(s.get_item(23)?.is_some());
        assert!(s.get_item(21)?.is_none());
        assert!(s.get_item(22)?.is_none());
        Ok(())
    })
    .unwrap();
}

#[tokio::test]
async fn test_top_stories_snapshot() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/v0/topstories.json", json!([3, 2, 1])).await;
    for id in 1..=3 {
        mount_item(
            &server,
            json!({"id": id, "type": "story", "score": 50, "time": id}),
        )
        .await;
    }

    let config = create_test_config(&server.uri(), &db_path(&dir));
    let coordinator = Coordinator::connect(config).unwrap();

    // Only stories 1 and 3 were ingested beforehand
    coordinator.run_backfill(Some(1), Some(2)).await.unwrap();
    coordinator.run_backfill(Some(3), Some(4)).await.unwrap();

    let snapshot = coordinator.sync_top_stories().await.unwrap();
    assert_eq!(snapshot.story_ids, vec![3, 1]);

    let latest = with_store(coordinator.store(), |s| s.latest_top_stories())
        .unwrap()
        .unwrap();
    assert_eq!(latest.story_ids, vec![3, 1]);
    assert!(with_store(coordinator.store(), |s| s.get_item(2))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unreachable_api_fails_startup() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/maxitem.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), &db_path(&dir));
    let coordinator = Coordinator::connect(config).unwrap();

    let result = coordinator.run_backfill(Some(0), None).await;
    assert!(matches!(result, Err(hn_ingest::IngestError::Startup(_))));
}
