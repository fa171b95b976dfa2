//! Password hashing bridge.
//!
//! # Data Flow
//! ```text
//! caller (login, registration, settings)
//!     → pool.rs (queue, checkout worker, deadline)
//!     → protocol.rs (one JSON task line on worker stdin)
//!     → hash-worker process → worker.rs (bcrypt, one JSON reply line)
//!     → pool.rs (reply → Result, worker back to the pool or killed)
//! ```
//!
//! # Design Decisions
//! - bcrypt runs in separate processes so it never stalls the runtime
//! - Fixed-size pool with a bounded queue instead of one process per call
//! - Every call has a deadline; a late worker is killed, not waited for

pub mod command;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod worker;

pub use command::WorkerCommand;
pub use error::{HashingError, HashingResult};
pub use pool::HashingPool;
pub use protocol::{Outcome, Reply, Task};
