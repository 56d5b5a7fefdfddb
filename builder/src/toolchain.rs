//! The external Go toolchain behind a trait seam.
//!
//! [`Toolchain`] covers the two phases the builder needs: fetching module
//! dependencies and compiling the generated program. [`GoToolchain`] runs the
//! real `go` binary; tests substitute a mock or the `StubToolchain` from the
//! `test-support` feature.

use crate::cancel::CancellationToken;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

/// How often a running phase checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A toolchain process could not be run to completion.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The process could not be started.
    #[error("failed to start {program}")]
    Spawn {
        /// The program that was run.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process failed.
    #[error("failed to wait for {program}")]
    Wait {
        /// The program that was run.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cancellation token was raised; the process was killed and reaped.
    #[error("{program} was cancelled")]
    Cancelled {
        /// The program that was run.
        program: String,
    },
}

/// Exit status and captured output of one toolchain phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// The external build toolchain.
#[cfg_attr(test, mockall::automock)]
pub trait Toolchain {
    /// Fetch the dependencies of the module in `workdir` (`go mod tidy`).
    ///
    /// # Errors
    ///
    /// Returns a [`ToolchainError`] when the process cannot be run or is
    /// cancelled. An unsuccessful exit is reported through the output.
    fn fetch(
        &self,
        workdir: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError>;

    /// Compile the module in `workdir` into the executable `exe_name`.
    ///
    /// # Errors
    ///
    /// As for [`Toolchain::fetch`].
    fn compile(
        &self,
        workdir: &Utf8Path,
        exe_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError>;
}

/// [`Toolchain`] that runs a `go` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoToolchain {
    go: Utf8PathBuf,
}

impl GoToolchain {
    /// Use the given `go` binary; a bare name is looked up on `PATH`.
    #[must_use]
    pub fn new(go: impl Into<Utf8PathBuf>) -> Self {
        Self { go: go.into() }
    }

    /// The `go` binary this toolchain runs.
    #[must_use]
    pub fn go(&self) -> &Utf8Path {
        &self.go
    }

    fn run(
        &self,
        args: &[&str],
        workdir: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let program = self.go.to_string();
        debug!("running {program} {} in {workdir}", args.join(" "));

        let mut command = Command::new(self.go.as_std_path());
        command
            .args(args)
            .current_dir(workdir.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // `go` forks compiler, linker and VCS workers. A dedicated process
        // group lets cancellation take all of them down together.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Both pipes are drained concurrently so a chatty child cannot block
        // on a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_or_cancel(&mut child, &program, cancel)?;

        Ok(ToolchainOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Toolchain for GoToolchain {
    fn fetch(
        &self,
        workdir: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.run(&["mod", "tidy"], workdir, cancel)
    }

    fn compile(
        &self,
        workdir: &Utf8Path,
        exe_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.run(
            &["build", "-trimpath", "-ldflags=-s -w", "-o", exe_name],
            workdir,
            cancel,
        )
    }
}

/// Poll `child` until it exits or `cancel` is raised.
fn wait_or_cancel(
    child: &mut Child,
    program: &str,
    cancel: &CancellationToken,
) -> Result<ExitStatus, ToolchainError> {
    loop {
        if cancel.is_cancelled() {
            warn!("cancelling {program}");
            reap(child);
            return Err(ToolchainError::Cancelled {
                program: program.to_owned(),
            });
        }

        match child.wait_timeout(POLL_INTERVAL) {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(source) => {
                reap(child);
                return Err(ToolchainError::Wait {
                    program: program.to_owned(),
                    source,
                });
            }
        }
    }
}

/// Kill `child` together with everything it spawned, then reap it.
fn reap(child: &mut Child) {
    kill_tree(child);
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    match i32::try_from(child.id()) {
        Ok(pgid) => {
            // SAFETY: `kill` has no memory-safety preconditions. The child
            // leads its own process group and is not reaped yet, so the group
            // id cannot have been reused.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                debug!(
                    "failed to signal process group {pgid}: {}",
                    std::io::Error::last_os_error()
                );
                let _ = child.kill();
            }
        }
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
