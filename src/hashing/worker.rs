//! Worker side of the hashing bridge.
//!
//! Runs inside the `hash-worker` process: reads task lines from stdin,
//! computes them synchronously and answers each with exactly one reply line.
//! Every failure becomes a reply; the loop only ends on EOF or a broken pipe.

use std::io::{self, BufRead, Write};

use crate::hashing::protocol::{Outcome, Reply, Task};

/// Environment variable through which the supervisor hands down a debug port.
pub const DEBUG_PORT_ENV: &str = "HASH_WORKER_DEBUG_PORT";

/// Execute one task.
pub fn perform(task: &Task) -> Reply {
    match task {
        Task::Hash { rounds, password } => match bcrypt::hash(password, *rounds) {
            Ok(hash) => Reply::ok(Outcome::Hash(hash)),
            Err(e) => Reply::failed(e.to_string()),
        },
        Task::Compare { password, hash } => match bcrypt::verify(password, hash) {
            Ok(matched) => Reply::ok(Outcome::Matched(matched)),
            Err(e) => Reply::failed(e.to_string()),
        },
    }
}

/// Answer tasks until the reader is exhausted. Returns the number served.
pub fn serve<R: BufRead, W: Write>(reader: R, mut writer: W) -> io::Result<usize> {
    let mut served = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<Task>(&line) {
            Ok(task) => {
                tracing::debug!(op = task.op(), "Task received");
                perform(&task)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed task");
                Reply::failed(format!("malformed task: {}", e))
            }
        };

        serde_json::to_writer(&mut writer, &reply)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        served += 1;
    }

    Ok(served)
}

/// Debug port requested by the supervisor, if any.
pub fn debug_port_from_env() -> Option<u16> {
    std::env::var(DEBUG_PORT_ENV).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Vec<Reply> {
        let mut out = Vec::new();
        serve(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_hash_then_compare() {
        let hashed = perform(&Task::Hash {
            rounds: 4,
            password: "correct horse".into(),
        });
        let hash = match hashed.result {
            Some(Outcome::Hash(h)) => h,
            other => panic!("unexpected reply: {:?}", other),
        };

        let same = perform(&Task::Compare {
            password: "correct horse".into(),
            hash: hash.clone(),
        });
        assert_eq!(same, Reply::ok(Outcome::Matched(true)));

        let other = perform(&Task::Compare {
            password: "battery staple".into(),
            hash,
        });
        assert_eq!(other, Reply::ok(Outcome::Matched(false)));
    }

    #[test]
    fn test_invalid_cost_is_reported() {
        let reply = perform(&Task::Hash {
            rounds: 2,
            password: "x".into(),
        });
        assert!(reply.err.is_some());
        assert!(reply.result.is_none());
    }

    #[test]
    fn test_invalid_hash_is_reported() {
        let reply = perform(&Task::Compare {
            password: "x".into(),
            hash: "not-a-bcrypt-hash".into(),
        });
        assert!(reply.err.is_some());
    }

    #[test]
    fn test_serve_one_reply_per_line() {
        let replies = run(concat!(
            "{\"type\":\"hash\",\"rounds\":4,\"password\":\"a\"}\n",
            "\n",
            "garbage\n",
            "{\"type\":\"compare\",\"password\":\"a\",\"hash\":\"nope\"}\n",
        ));
        assert_eq!(replies.len(), 3);
        assert!(matches!(replies[0].result, Some(Outcome::Hash(_))));
        assert!(replies[1].err.as_deref().unwrap().starts_with("malformed task"));
        assert!(replies[2].err.is_some());
    }
}
