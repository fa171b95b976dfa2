//! Supervisor side of the hashing bridge: a bounded pool of worker processes.
//!
//! # Responsibilities
//! - Keep at most `pool_size` long-lived workers
//! - Queue callers beyond that (FIFO) and reject past `queue_depth`
//! - Bound every call with a timeout; kill workers that miss it, and
//!   report callers that never got a worker separately
//! - Discard workers whose pipe broke or that sent garbage
//!
//! # Design Decisions
//! - A worker that reports an error is healthy and goes back to the pool
//! - A checked-out worker dropped mid-call because the caller gave up is
//!   killed via `kill_on_drop`; its state is unknown
//! - No retries: every failure surfaces to the caller once

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Semaphore;

use crate::config::HashingConfig;
use crate::hashing::command::WorkerCommand;
use crate::hashing::error::{HashingError, HashingResult};
use crate::hashing::protocol::{Outcome, Reply, Task};
use crate::observability::metrics;

/// A running worker process and its pipes.
struct Worker {
    id: u64,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(command: &WorkerCommand, id: u64) -> HashingResult<Self> {
        let mut child = command.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("worker stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("worker stdout was not captured"))?;

        tracing::debug!(worker = id, pid = ?child.id(), "Hash worker spawned");
        Ok(Self {
            id,
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send one task line and read one reply line.
    async fn exchange(&mut self, task: &Task) -> HashingResult<Reply> {
        let mut line = serde_json::to_vec(task).map_err(std::io::Error::from)?;
        line.push(b'\n');

        match self.stdin.write_all(&line).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => return Err(HashingError::Exited),
            Err(e) => return Err(e.into()),
        }
        self.stdin.flush().await?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply).await? == 0 {
            return Err(HashingError::Exited);
        }

        serde_json::from_str(&reply).map_err(|e| HashingError::MalformedReply(e.to_string()))
    }

    fn kill(mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(worker = self.id, error = %e, "Hash worker already gone");
        }
    }
}

/// Counts a call as pending for as long as it is alive.
struct PendingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingGuard<'a> {
    fn try_enter(counter: &'a AtomicUsize, limit: usize) -> HashingResult<Self> {
        let mut prev = counter.load(Ordering::Relaxed);
        loop {
            if prev >= limit {
                return Err(HashingError::Saturated(prev));
            }
            match counter.compare_exchange_weak(prev, prev + 1, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Ok(Self { counter })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Bounded pool of hash worker processes.
pub struct HashingPool {
    command: WorkerCommand,
    pool_size: usize,
    max_pending: usize,
    default_timeout: Duration,
    permits: Semaphore,
    idle: Mutex<Vec<Worker>>,
    pending: AtomicUsize,
    spawned: AtomicU64,
}

impl HashingPool {
    /// Create an empty pool. Workers are spawned on demand or by [`warm_up`].
    ///
    /// [`warm_up`]: HashingPool::warm_up
    pub fn new(command: WorkerCommand, config: &HashingConfig) -> Self {
        let pool_size = config.pool_size.max(1);
        Self {
            command,
            pool_size,
            max_pending: pool_size + config.queue_depth,
            default_timeout: Duration::from_millis(config.timeout_ms),
            permits: Semaphore::new(pool_size),
            idle: Mutex::new(Vec::with_capacity(pool_size)),
            pending: AtomicUsize::new(0),
            spawned: AtomicU64::new(0),
        }
    }

    /// Create a pool for the configured worker program.
    pub fn from_config(config: &HashingConfig) -> std::io::Result<Self> {
        Ok(Self::new(WorkerCommand::from_config(config)?, config))
    }

    /// Pre-spawn workers until the pool is full. Meant to run before serving.
    pub fn warm_up(&self) -> HashingResult<usize> {
        let mut idle = self.idle.lock().expect("hashing pool mutex poisoned");
        let busy = self.in_flight();
        let mut started = 0;
        while idle.len() + busy < self.pool_size {
            idle.push(self.spawn_worker()?);
            started += 1;
        }

        tracing::info!(workers = idle.len(), program = %self.command.program().display(), "Hashing pool warmed up");
        Ok(started)
    }

    /// Hash `password` with bcrypt at the given cost.
    pub async fn hash(&self, rounds: u32, password: &str) -> HashingResult<String> {
        self.hash_within(rounds, password, self.default_timeout).await
    }

    /// [`hash`](HashingPool::hash) with a caller-supplied deadline.
    pub async fn hash_within(&self, rounds: u32, password: &str, timeout: Duration) -> HashingResult<String> {
        let task = Task::Hash {
            rounds,
            password: password.to_string(),
        };
        match self.submit(task, timeout).await? {
            Outcome::Hash(hash) => Ok(hash),
            Outcome::Matched(m) => Err(HashingError::MalformedReply(format!(
                "expected a hash string, got {}",
                m
            ))),
        }
    }

    /// Check `password` against a stored bcrypt `hash`.
    ///
    /// Empty input never matches and never reaches a worker.
    pub async fn compare(&self, password: &str, hash: &str) -> HashingResult<bool> {
        self.compare_within(password, hash, self.default_timeout).await
    }

    /// [`compare`](HashingPool::compare) with a caller-supplied deadline.
    pub async fn compare_within(&self, password: &str, hash: &str, timeout: Duration) -> HashingResult<bool> {
        if password.is_empty() || hash.is_empty() {
            return Ok(false);
        }

        let task = Task::Compare {
            password: password.to_string(),
            hash: hash.to_string(),
        };
        match self.submit(task, timeout).await? {
            Outcome::Matched(matched) => Ok(matched),
            Outcome::Hash(_) => Err(HashingError::MalformedReply(
                "expected a boolean, got a string".to_string(),
            )),
        }
    }

    /// Total worker processes started over the pool's lifetime.
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Workers currently parked and ready.
    pub fn idle(&self) -> usize {
        self.idle.lock().expect("hashing pool mutex poisoned").len()
    }

    /// Calls currently holding a worker slot.
    pub fn in_flight(&self) -> usize {
        self.pool_size - self.permits.available_permits()
    }

    /// Calls running or waiting for a slot.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    async fn submit(&self, task: Task, timeout: Duration) -> HashingResult<Outcome> {
        let _pending = PendingGuard::try_enter(&self.pending, self.max_pending).inspect_err(|e| {
            tracing::warn!(op = task.op(), error = %e, "Rejecting hashing call");
        })?;
        let start = Instant::now();

        let result = self.run(&task, timeout).await;

        metrics::record_hash_call(task.op(), result.as_ref().err().map(HashingError::kind), start);
        result
    }

    /// Wait for a slot, then run `task` on a worker. Both phases share one
    /// deadline, `timeout` from now.
    async fn run(&self, task: &Task, timeout: Duration) -> HashingResult<Outcome> {
        let deadline = tokio::time::Instant::now() + timeout;

        let _permit = match tokio::time::timeout_at(deadline, self.permits.acquire()).await {
            Ok(permit) => permit.map_err(|_| HashingError::Closed)?,
            Err(_) => {
                tracing::warn!(op = task.op(), timeout = ?timeout, "Timed out waiting for a hash worker");
                return Err(HashingError::QueueTimeout(timeout));
            }
        };
        let mut worker = self.checkout()?;

        match tokio::time::timeout_at(deadline, worker.exchange(task)).await {
            Ok(Ok(reply)) => {
                self.checkin(worker);
                match reply {
                    Reply { err: Some(message), .. } => Err(HashingError::WorkerReported(message)),
                    Reply { result: Some(outcome), .. } => Ok(outcome),
                    Reply { .. } => Err(HashingError::MalformedReply(
                        "reply carried neither err nor result".to_string(),
                    )),
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(worker = worker.id, op = task.op(), error = %e, "Discarding hash worker");
                worker.kill();
                Err(e)
            }
            Err(_) => {
                tracing::warn!(worker = worker.id, op = task.op(), timeout = ?timeout, "Hash worker timed out, killed");
                worker.kill();
                Err(HashingError::Timeout(timeout))
            }
        }
    }

    fn checkout(&self) -> HashingResult<Worker> {
        loop {
            let candidate = self.idle.lock().expect("hashing pool mutex poisoned").pop();
            match candidate {
                Some(mut worker) => {
                    if worker.is_alive() {
                        return Ok(worker);
                    }
                    tracing::debug!(worker = worker.id, "Idle hash worker exited, replacing");
                }
                None => return self.spawn_worker(),
            }
        }
    }

    fn checkin(&self, worker: Worker) {
        self.idle.lock().expect("hashing pool mutex poisoned").push(worker);
    }

    fn spawn_worker(&self) -> HashingResult<Worker> {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_worker_spawn();
        Worker::spawn(&self.command, id)
    }
}

impl std::fmt::Debug for HashingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingPool")
            .field("command", &self.command)
            .field("pool_size", &self.pool_size)
            .field("spawned", &self.spawned())
            .field("pending", &self.pending())
            .finish()
    }
}
