//! How worker processes are launched.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::HashingConfig;
use crate::hashing::error::{HashingError, HashingResult};
use crate::hashing::worker::DEBUG_PORT_ENV;

/// Name of the worker binary shipped with this crate.
pub const WORKER_BINARY: &str = "hash-worker";

/// Program, arguments and environment for spawning a hash worker.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
    debug_port: Option<u16>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            debug_port: None,
        }
    }

    /// Build from config, defaulting to the `hash-worker` binary installed
    /// next to the current executable.
    pub fn from_config(config: &HashingConfig) -> std::io::Result<Self> {
        let program = match &config.worker_program {
            Some(program) => program.clone(),
            None => std::env::current_exe()?
                .with_file_name(format!("{}{}", WORKER_BINARY, std::env::consts::EXE_SUFFIX)),
        };

        Ok(Self::new(program)
            .args(config.worker_args.iter().cloned())
            .debug_port(config.debug_port))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Debug port of the supervising process. Workers get the next port.
    pub fn debug_port(mut self, port: Option<u16>) -> Self {
        self.debug_port = port;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Port handed to each worker, if the supervisor is being debugged.
    pub fn child_debug_port(&self) -> Option<u16> {
        self.debug_port?.checked_add(1)
    }

    /// Start a worker with piped stdin/stdout. Its stderr is inherited so
    /// worker logs land next to ours.
    pub(crate) fn spawn(&self) -> HashingResult<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        match self.child_debug_port() {
            Some(port) => {
                command.env(DEBUG_PORT_ENV, port.to_string());
            }
            None => {
                if self.debug_port.is_some() {
                    tracing::warn!(port = ?self.debug_port, "No free debug port above supervisor's, worker runs without one");
                }
                command.env_remove(DEBUG_PORT_ENV);
            }
        }

        command.spawn().map_err(|source| HashingError::Spawn {
            program: self.program.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_debug_port_is_incremented() {
        let command = WorkerCommand::new("hash-worker").debug_port(Some(9229));
        assert_eq!(command.child_debug_port(), Some(9230));
    }

    #[test]
    fn test_child_debug_port_overflow_is_dropped() {
        let command = WorkerCommand::new("hash-worker").debug_port(Some(u16::MAX));
        assert_eq!(command.child_debug_port(), None);
        assert_eq!(WorkerCommand::new("hash-worker").child_debug_port(), None);
    }

    #[test]
    fn test_from_config_defaults_to_sibling_binary() {
        let command = WorkerCommand::from_config(&HashingConfig::default()).unwrap();
        let name = command.program().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(WORKER_BINARY));
    }

    #[test]
    fn test_from_config_explicit_program() {
        let config = HashingConfig {
            worker_program: Some(PathBuf::from("/opt/forum/bin/worker")),
            worker_args: vec!["--quiet".into()],
            ..HashingConfig::default()
        };
        let command = WorkerCommand::from_config(&config).unwrap();
        assert_eq!(command.program(), Path::new("/opt/forum/bin/worker"));
        assert_eq!(command.args, vec!["--quiet".to_string()]);
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = WorkerCommand::new("/nonexistent/hash-worker").spawn().unwrap_err();
        assert!(matches!(err, HashingError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/hash-worker"));
    }
}
