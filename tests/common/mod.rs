//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use forum_server::config::{ForumConfig, HashingConfig};
use forum_server::hashing::{HashingPool, WorkerCommand};
use forum_server::http::HttpServer;
use forum_server::lifecycle::Shutdown;
use forum_server::redirection::{RedirectStore, RuleSource};

/// Front matter document with the given rule lines under `redirections:`.
pub fn rules_document(rules: &[(&str, &str)]) -> String {
    let mut doc = String::from("---\nredirections:\n");
    for (origin, path) in rules {
        doc.push_str(&format!("  - origin: '{}'\n    path: '{}'\n", origin, path));
    }
    doc.push_str("---\nManaged by the ops team.\n");
    doc
}

pub fn write_rules(dir: &Path, rules: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("redirections.md");
    std::fs::write(&path, rules_document(rules)).unwrap();
    path
}

pub fn store_for(path: &Path) -> Arc<RedirectStore> {
    Arc::new(RedirectStore::from_source(RuleSource {
        file: Some(path.to_path_buf()),
        ..RuleSource::default()
    }))
}

/// Pool backed by the real `hash-worker` binary.
pub fn worker_pool(pool_size: usize) -> HashingPool {
    let config = HashingConfig {
        pool_size,
        queue_depth: 16,
        timeout_ms: 20_000,
        ..HashingConfig::default()
    };
    HashingPool::new(WorkerCommand::new(env!("CARGO_BIN_EXE_hash-worker")), &config)
}

/// Start a server on an ephemeral port. Keep the returned `Shutdown` alive.
pub async fn start_server(store: Arc<RedirectStore>) -> (SocketAddr, Shutdown) {
    let mut config = ForumConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, store, Arc::new(worker_pool(1)));
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
