//! End-to-end crawl tests against mock sites

use crate::common::{html, memory_storage, png, refused_url, site, stored_paths, test_config};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sumi_index::crawler::{
    run_once, CrawlScope, CrawlSettings, CrawlTask, IndexingCoordinator, StopSignal,
    STOPPED_BY_USER,
};
use sumi_index::state::SiteStatus;
use sumi_index::storage::SqliteStorage;
use tokio::task::JoinSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_full_crawl_skips_images() {
    let server = MockServer::start().await;
    let root = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/">Home</a>
                <a href="/a">A</a>
                <a href="/logo.png">Logo</a>
                <a href="https://elsewhere.test/">Elsewhere</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">Back</a><a href="/logo.png">Logo</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(png())
        .mount(&server)
        .await;

    let storage = memory_storage();
    let config = test_config(vec![site(&root, "Example")], ":memory:");
    let coordinator = IndexingCoordinator::new(&config, Arc::clone(&storage)).unwrap();

    let summary = coordinator.start().unwrap().wait().await.unwrap();
    assert_eq!(summary.indexed, 1);

    let record = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Indexed);
    assert!(record.last_error.is_none());

    assert_eq!(
        stored_paths(storage.as_ref(), &root),
        vec![root.clone(), format!("{}/a", root)]
    );
    assert!(!storage.page_exists(&format!("{}/logo.png", root)).unwrap());
}

#[tokio::test]
async fn test_connection_refused_fails_site() {
    let root = refused_url();
    let storage = memory_storage();
    let config = test_config(vec![site(&root, "Down")], ":memory:");
    let coordinator = IndexingCoordinator::new(&config, Arc::clone(&storage)).unwrap();

    let summary = coordinator.start().unwrap().wait().await.unwrap();
    assert_eq!(summary.failed, 1);

    let record = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Failed);
    let error = record.last_error.unwrap();
    assert!(error.contains(&root), "unexpected error: {}", error);
    assert_ne!(error, STOPPED_BY_USER);
    assert_eq!(storage.count_pages_for_site(record.id).unwrap(), 0);
}

#[tokio::test]
async fn test_failed_branch_keeps_site_failed() {
    let server = MockServer::start().await;
    let root = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/ok">ok</a><a href="/broken">broken</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>fine</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let storage = memory_storage();
    let config = test_config(vec![site(&root, "Partial")], ":memory:");
    let coordinator = IndexingCoordinator::new(&config, Arc::clone(&storage)).unwrap();

    let summary = coordinator.start().unwrap().wait().await.unwrap();
    assert_eq!(summary.failed, 1);

    let record = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Failed);
    assert!(record.last_error.unwrap().contains("/broken"));
    assert_eq!(
        stored_paths(storage.as_ref(), &root),
        vec![root.clone(), format!("{}/ok", root)]
    );
}

#[tokio::test]
async fn test_non_text_root_does_not_fail_site() {
    let server = MockServer::start().await;
    let root = server.uri();

    Mock::given(method("GET"))
        .respond_with(png())
        .expect(1)
        .mount(&server)
        .await;

    let storage = memory_storage();
    let config = test_config(vec![site(&root, "Images")], ":memory:");
    let coordinator = IndexingCoordinator::new(&config, Arc::clone(&storage)).unwrap();

    coordinator.start().unwrap().wait().await.unwrap();

    let record = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(record.status, SiteStatus::Indexed);
    assert_eq!(storage.count_pages_for_site(record.id).unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_tasks_store_one_page() {
    let server = MockServer::start().await;
    let root = server.uri();
    let target = format!("{}/shared", root);

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html("<p>shared</p>").set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;

    let storage = memory_storage();
    let record = storage
        .insert_site(&root, "Race", SiteStatus::Indexing)
        .unwrap();
    let scope = CrawlScope::new(
        record.clone(),
        StopSignal::new(),
        Arc::clone(&storage),
        reqwest::Client::new(),
        CrawlSettings {
            referrer: "https://www.google.com".to_string(),
            request_delay: Duration::ZERO,
            max_depth: None,
            fetch_concurrency: 8,
        },
    );

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        tasks.spawn(CrawlTask::root(target.clone(), Arc::clone(&scope)).run());
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    assert_eq!(storage.count_pages_for_site(record.id).unwrap(), 1);
    assert_eq!(
        storage.get_site(record.id).unwrap().status,
        SiteStatus::Indexing
    );
}

#[tokio::test]
async fn test_stop_seen_at_task_entry_fails_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>never</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let storage = memory_storage();
    let record = storage
        .insert_site(&server.uri(), "Stopped", SiteStatus::Indexing)
        .unwrap();
    let signal = StopSignal::new();
    signal.stop();

    let scope = CrawlScope::new(
        record.clone(),
        signal,
        Arc::clone(&storage),
        reqwest::Client::new(),
        CrawlSettings {
            referrer: "https://www.google.com".to_string(),
            request_delay: Duration::ZERO,
            max_depth: None,
            fetch_concurrency: 1,
        },
    );
    CrawlTask::root(server.uri(), scope).run().await.unwrap();

    let record = storage.get_site(record.id).unwrap();
    assert_eq!(record.status, SiteStatus::Failed);
    assert_eq!(record.last_error.as_deref(), Some(STOPPED_BY_USER));
    assert_eq!(storage.count_pages_for_site(record.id).unwrap(), 0);
}

#[tokio::test]
async fn test_run_once_writes_database_file() {
    let server = MockServer::start().await;
    let root = server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<p>about</p>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("index.db");
    let config = test_config(
        vec![site(&root, "Example")],
        db_path.to_str().unwrap(),
    );

    let summary = run_once(&config).await.unwrap();
    assert_eq!(summary.indexed, 1);

    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    assert_eq!(
        stored_paths(&storage, &root),
        vec![root.clone(), format!("{}/about", root)]
    );
}
