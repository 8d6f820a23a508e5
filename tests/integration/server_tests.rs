//! HTTP surface tests driven through the router

use crate::common::{html, memory_storage, site, test_config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use sumi_index::crawler::IndexingCoordinator;
use sumi_index::server::{create_router, AppState, IndexingResponse};
use sumi_index::storage::Storage;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

fn app_for(root: &str, storage: Arc<dyn Storage>) -> (Router, Arc<IndexingCoordinator>) {
    let config = test_config(vec![site(root, "Test")], ":memory:");
    let coordinator = Arc::new(IndexingCoordinator::new(&config, storage).unwrap());
    (
        create_router(AppState::new(Arc::clone(&coordinator))),
        coordinator,
    )
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, IndexingResponse) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_start_then_start_again_then_stop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let (app, coordinator) = app_for(&server.uri(), memory_storage());

    let (status, body) = call(&app, get("/api/startIndexing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, IndexingResponse::ok());

    let (status, body) = call(&app, get("/api/startIndexing")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.result);
    assert_eq!(body.error.as_deref(), Some("crawl already in progress"));

    let (status, body) = call(&app, get("/api/stopIndexing")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.result);
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_index_page_accepts_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<p>page</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let root = server.uri();
    let page_url = format!("{}/page", root);
    let storage = memory_storage();
    let (app, _coordinator) = app_for(&root, Arc::clone(&storage));

    let encoded: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", &page_url)
        .finish();
    let request = Request::builder()
        .method("POST")
        .uri("/api/indexPage")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(encoded))
        .unwrap();

    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, IndexingResponse::ok());
    assert!(storage.page_exists(&page_url).unwrap());
}

#[tokio::test]
async fn test_index_page_rejects_invalid_url() {
    let (app, _coordinator) = app_for("https://a.test", memory_storage());

    let request = Request::builder()
        .method("POST")
        .uri("/api/indexPage")
        .body(Body::from("not a url"))
        .unwrap();

    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body.result);
    assert!(body.error.unwrap().starts_with("Invalid page URL"));
}
