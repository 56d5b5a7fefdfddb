//! Compile orchestration: fetch dependencies, then build the binary.

use crate::cancel::CancellationToken;
use crate::error::{BuildError, Stage};
use crate::generator::GenerationResult;
use crate::toolchain::{Toolchain, ToolchainError, ToolchainOutput};
use camino::Utf8PathBuf;
use log::info;

/// Options for the compile phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Executable name of the produced binary.
    pub name: String,
    /// Skip both toolchain phases.
    pub skip: bool,
}

/// Turn generated sources into an executable.
///
/// Runs [`Toolchain::fetch`] then [`Toolchain::compile`] in the output
/// directory. With `options.skip` set, nothing is invoked and `Ok(None)` is
/// returned. On success the binary is `<output_dir>/<name>`.
///
/// # Errors
///
/// - [`BuildError::FetchFailed`] / [`BuildError::CompileFailed`] carry the
///   exit status and the toolchain's output verbatim.
/// - [`BuildError::Cancelled`] when `cancel` is raised mid-phase.
/// - [`BuildError::Toolchain`] when a phase cannot be run at all.
pub fn compile(
    generation: &GenerationResult,
    toolchain: &dyn Toolchain,
    options: &CompileOptions,
    cancel: &CancellationToken,
) -> Result<Option<Utf8PathBuf>, BuildError> {
    if options.skip {
        info!("skipping compilation of {}", options.name);
        return Ok(None);
    }

    let workdir = &generation.output_dir;

    info!("fetching dependencies in {workdir}");
    let fetched = toolchain
        .fetch(workdir, cancel)
        .map_err(|err| phase_error(Stage::Fetch, err))?;
    if !fetched.status.success() {
        return Err(failure(Stage::Fetch, fetched));
    }

    info!("compiling {} in {workdir}", options.name);
    let built = toolchain
        .compile(workdir, &options.name, cancel)
        .map_err(|err| phase_error(Stage::Compile, err))?;
    if !built.status.success() {
        return Err(failure(Stage::Compile, built));
    }

    Ok(Some(workdir.join(&options.name)))
}

fn phase_error(stage: Stage, err: ToolchainError) -> BuildError {
    match err {
        ToolchainError::Cancelled { .. } => BuildError::Cancelled { stage },
        source => BuildError::Toolchain { stage, source },
    }
}

fn failure(stage: Stage, output: ToolchainOutput) -> BuildError {
    let ToolchainOutput {
        status,
        stdout,
        stderr,
    } = output;
    let status = status.code();
    if stage == Stage::Fetch {
        BuildError::FetchFailed {
            status,
            stdout,
            stderr,
        }
    } else {
        BuildError::CompileFailed {
            status,
            stdout,
            stderr,
        }
    }
}
