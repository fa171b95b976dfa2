//! Forum edge server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!  Client request     │                 FORUM SERVER                  │
//!  ───────────────────┼─▶ request id ─▶ trace ─▶ redirect middleware │
//!                     │                              │     │         │
//!  ◀── 301 Location ──┼──────────────────────────────┘     ▼         │
//!  ◀── response ──────┼────────────────────────────── handlers       │
//!                     │                                              │
//!                     │  RedirectStore ◀── notify watcher / SIGHUP   │
//!                     │  HashingPool ───▶ hash-worker processes      │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use forum_server::config::{load_config, ForumConfig};
use forum_server::hashing::HashingPool;
use forum_server::http::HttpServer;
use forum_server::lifecycle::{signals, Shutdown};
use forum_server::observability::{logging, metrics};
use forum_server::redirection::{RedirectStore, RuleWatcher};

#[derive(Parser)]
#[command(name = "forum-server")]
#[command(about = "Forum edge server: legacy redirects and password hashing workers", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used without it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ForumConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "forum-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        redirections_file = ?config.redirections.file,
        hash_workers = config.hashing.pool_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // No route here hashes; the pool serves callers embedding this crate.
    // Workers start on first use unless asked for at boot.
    let hashing = Arc::new(HashingPool::from_config(&config.hashing)?);
    if config.hashing.prespawn {
        hashing.warm_up()?;
    }

    let redirects = Arc::new(RedirectStore::new(&config.redirections, &config.domains));
    let rules = redirects.clone().preload().await?;
    tracing::info!(state = rules.state().as_str(), rules = rules.len(), "Redirection rules ready");
    let _watcher = if config.redirections.watch {
        RuleWatcher::new(redirects.clone()).map(RuleWatcher::run).transpose()?
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::handle_signals(shutdown.clone(), redirects.clone()));

    let server = HttpServer::new(config, redirects, hashing);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
