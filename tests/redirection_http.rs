//! Redirection middleware and rule reloading, end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware, Router,
};
use tower::ServiceExt;

use forum_server::http::middleware::redirect_middleware;
use forum_server::redirection::{LoadState, RedirectStore, RuleWatcher};

mod common;

/// Router whose only downstream handler counts how often it is reached.
fn counting_app(store: Arc<RedirectStore>, hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .fallback(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                "downstream"
            }
        })
        .layer(middleware::from_fn_with_state(store, redirect_middleware))
}

async fn get(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_first_matching_rule_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/old/a", "/new/a"), ("/old", "/fallback")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = counting_app(common::store_for(&path), hits.clone());

    let response = get(app, "/old/a/extra").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "/new/a/extra");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unmatched_path_passes_through_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/old", "/new")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = counting_app(common::store_for(&path), hits.clone());

    let response = get(app, "/recent?page=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_whole_path_match_never_sends_empty_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/forum", "")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = counting_app(common::store_for(&path), hits.clone());

    let response = get(app, "/forum").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "/");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_doubled_slash_stays_on_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/forum/", "/")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = counting_app(common::store_for(&path), hits.clone());

    let response = get(app, "/forum//evil.example/x").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "/evil.example/x");
    assert!(!location(&response).starts_with("//"));
}

#[tokio::test]
async fn test_corrupt_file_passes_everything_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("redirections.md");
    std::fs::write(&path, "---\nredirections: [ {origin: /old, path: \n").unwrap();

    let store = common::store_for(&path);
    let hits = Arc::new(AtomicUsize::new(0));

    for target in ["/old", "/anything", "/"] {
        let response = get(counting_app(store.clone(), hits.clone()), target).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(store.peek().state(), LoadState::Failed);
}

#[tokio::test]
async fn test_missing_file_passes_everything_through() {
    let dir = tempfile::tempdir().unwrap();
    let store = common::store_for(&dir.path().join("nope.md"));
    let hits = Arc::new(AtomicUsize::new(0));

    let response = get(counting_app(store, hits.clone()), "/old").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reload_is_atomic_for_readers() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/v1/a", "/one/a"), ("/v1/b", "/one/b")]);
    let store = common::store_for(&path);

    let in_flight = store.snapshot();

    common::write_rules(dir.path(), &[("/v2/a", "/two/a")]);
    assert_eq!(store.reload(), LoadState::Loaded);

    // The request that started before the update sees only the old table.
    assert_eq!(in_flight.len(), 2);
    assert_eq!(in_flight.resolve("/v1/b").as_deref(), Some("/one/b"));
    assert_eq!(in_flight.resolve("/v2/a"), None);

    let hits = Arc::new(AtomicUsize::new(0));
    let old = get(counting_app(store.clone(), hits.clone()), "/v1/a").await;
    assert_eq!(old.status(), StatusCode::OK);
    let new = get(counting_app(store, hits.clone()), "/v2/a").await;
    assert_eq!(location(&new), "/two/a");
}

#[tokio::test]
async fn test_watcher_picks_up_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/old", "/v1")]);
    let store = common::store_for(&path);
    assert_eq!(store.resolve("/old").as_deref(), Some("/v1"));

    let _watcher = RuleWatcher::new(store.clone()).unwrap().run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    common::write_rules(dir.path(), &[("/old", "/v2")]);

    let updated = common::eventually(Duration::from_secs(10), || {
        store.peek().resolve("/old").as_deref() == Some("/v2")
    })
    .await;
    assert!(updated, "watcher did not reload the rule file");
}

#[tokio::test]
async fn test_server_redirects_with_301() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/topic/(\\d+)", "/t/${1}")]);
    let (addr, shutdown) = common::start_server(common::store_for(&path)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/TOPIC/42/slug", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "/t/42/slug");
    assert!(res.headers().contains_key("x-request-id"));

    let res = client.get(format!("http://{}/unknown", addr)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["path"], "/unknown");

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_reports_rules_and_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_rules(dir.path(), &[("/old", "/new")]);
    let store = common::store_for(&path);
    let (addr, shutdown) = common::start_server(store.clone()).await;
    let client = common::client();

    let health: serde_json::Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "operational");
    assert_eq!(health["hashing"]["pool_size"], 1);
    assert_eq!(health["hashing"]["spawned"], 0);

    // The middleware ran first and did the lazy load.
    assert_eq!(health["redirections"]["state"], "loaded");
    assert_eq!(health["redirections"]["rules"], 1);
    assert_eq!(store.peek().state(), LoadState::Loaded);

    shutdown.trigger();
}
