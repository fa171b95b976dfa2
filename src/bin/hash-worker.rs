//! Hash worker process.
//!
//! Spawned by the server's hashing pool. Reads one JSON task per line on
//! stdin, writes one JSON reply per line on stdout, exits on EOF.

use std::io;

use forum_server::hashing::worker;
use forum_server::observability::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let debug_port = worker::debug_port_from_env();
    logging::init_worker_logging(debug_port);

    if let Some(port) = debug_port {
        tracing::debug!(port, pid = std::process::id(), "Hash worker started in debug mode");
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let served = worker::serve(stdin.lock(), stdout.lock())?;

    tracing::debug!(served, "Hash worker exiting");
    Ok(())
}
