//! Shared test utilities for the builder crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour suites under `tests/`.

use crate::cancel::CancellationToken;
use crate::error::Stage;
use crate::toolchain::{Toolchain, ToolchainError, ToolchainOutput};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::process::ExitStatus;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Scripted result of one stub phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// Exit 0 with empty output.
    Success,
    /// Exit with `code` and write `stderr`.
    Failure {
        /// Exit code reported.
        code: i32,
        /// Diagnostics reported on standard error.
        stderr: String,
    },
    /// Behave as if the caller cancelled the phase.
    Cancelled,
}

/// One recorded stub invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCall {
    /// The phase invoked.
    pub phase: Stage,
    /// Working directory passed in.
    pub workdir: Utf8PathBuf,
    /// Executable name, for compile calls.
    pub exe_name: Option<String>,
}

/// A [`Toolchain`] that never spawns a process.
///
/// Records every invocation and answers with scripted responses. A raised
/// cancellation token always wins over the scripted response.
#[derive(Debug)]
pub struct StubToolchain {
    fetch: StubResponse,
    compile: StubResponse,
    calls: RefCell<Vec<StubCall>>,
}

impl StubToolchain {
    /// A stub with the given responses for each phase.
    #[must_use]
    pub fn new(fetch: StubResponse, compile: StubResponse) -> Self {
        Self {
            fetch,
            compile,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Both phases succeed.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(StubResponse::Success, StubResponse::Success)
    }

    /// The fetch phase exits 1 with `stderr`.
    #[must_use]
    pub fn failing_fetch(stderr: &str) -> Self {
        Self::new(
            StubResponse::Failure {
                code: 1,
                stderr: stderr.to_owned(),
            },
            StubResponse::Success,
        )
    }

    /// The compile phase exits 1 with `stderr`.
    #[must_use]
    pub fn failing_compile(stderr: &str) -> Self {
        Self::new(
            StubResponse::Success,
            StubResponse::Failure {
                code: 1,
                stderr: stderr.to_owned(),
            },
        )
    }

    /// Every invocation so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.borrow().clone()
    }

    fn answer(
        &self,
        call: StubCall,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let response = if call.phase == Stage::Fetch {
            &self.fetch
        } else {
            &self.compile
        };
        self.calls.borrow_mut().push(call);

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        match response {
            StubResponse::Success => Ok(ToolchainOutput {
                status: exit_status(0),
                stdout: String::new(),
                stderr: String::new(),
            }),
            StubResponse::Failure { code, stderr } => Ok(ToolchainOutput {
                status: exit_status(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            StubResponse::Cancelled => {
                cancel.cancel();
                Err(cancelled())
            }
        }
    }
}

fn cancelled() -> ToolchainError {
    ToolchainError::Cancelled {
        program: "go".to_owned(),
    }
}

impl Toolchain for StubToolchain {
    fn fetch(
        &self,
        workdir: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let call = StubCall {
            phase: Stage::Fetch,
            workdir: workdir.to_owned(),
            exe_name: None,
        };
        self.answer(call, cancel)
    }

    fn compile(
        &self,
        workdir: &Utf8Path,
        exe_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let call = StubCall {
            phase: Stage::Compile,
            workdir: workdir.to_owned(),
            exe_name: Some(exe_name.to_owned()),
        };
        self.answer(call, cancel)
    }
}
