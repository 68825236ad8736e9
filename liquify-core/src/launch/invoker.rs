//! Subprocess invocation.
//!
//! The child inherits stdin, stdout, and stderr, so Liquibase talks to the
//! terminal directly. Nothing is captured or buffered here.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::process::Command;

use super::command::InvocationArgs;
use crate::observer::{LaunchEvent, Observer, TracingObserver};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to start {}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed waiting for {}", .program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} exited with {}", .program.display(), describe_code(.code))]
    Failed { program: PathBuf, code: Option<i32> },
}

impl ExecutionError {
    /// Exit code the launcher should finish with.
    ///
    /// The child's own code when it has one, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed {
                code: Some(code), ..
            } => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Runs an executable to completion with pass-through I/O.
pub struct Invoker {
    observer: Arc<dyn Observer>,
    working_dir: Option<PathBuf>,
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Invoker {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(TracingObserver),
            working_dir: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs the child in `dir` instead of the launcher's working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Spawns `program` with `args` and waits for it to exit.
    ///
    /// A zero exit is `Ok`. Anything else, including death by signal, is
    /// [`ExecutionError::Failed`].
    pub async fn invoke(&self, program: &Path, args: &InvocationArgs) -> Result<(), ExecutionError> {
        let mut command = Command::new(program);
        command
            .args(args.as_slice())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        self.observer.notify(&LaunchEvent::ProcessStarted {
            program: program.to_path_buf(),
            args: args.as_slice().to_vec(),
        });

        let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ExecutionError::Wait {
            program: program.to_path_buf(),
            source,
        })?;

        let code = status.code();
        self.observer.notify(&LaunchEvent::ProcessExited { code });

        if status.success() {
            Ok(())
        } else {
            Err(ExecutionError::Failed {
                program: program.to_path_buf(),
                code,
            })
        }
    }
}
