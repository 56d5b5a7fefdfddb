//! Build pipeline orchestration.
//!
//! [`BuildPipeline`] is the single entry point for callers. It runs the four
//! stages in order (validation, resolution, generation, compilation) and stops
//! at the first failure. Generated sources are left in place when the
//! toolchain fails so the failure can be reproduced by hand.

use crate::cancel::CancellationToken;
use crate::compile::{CompileOptions, compile};
use crate::config::BuilderConfig;
use crate::distribution::{ComponentEntry, Distribution};
use crate::error::BuildError;
use crate::generator::{GenerationResult, generate};
use crate::manifest::ResolutionWarning;
use crate::output::write_stderr_line;
use crate::resolver::resolve_distribution;
use crate::toolchain::Toolchain;
use crate::validation::validate;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::io::Write;

/// Prefix of the temporary directory used when no output path is set.
pub const TEMP_DIR_PREFIX: &str = "otelcol-distribution";

/// A successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Directory holding the generated sources and the binary.
    pub output_dir: Utf8PathBuf,
    /// The files the generator wrote.
    pub generation: GenerationResult,
    /// Non-fatal findings from resolution.
    pub warnings: Vec<ResolutionWarning>,
    /// The compiled executable; `None` when compilation was skipped.
    pub binary: Option<Utf8PathBuf>,
}

/// Result of one pipeline run.
pub type BuildOutcome = Result<BuildArtifact, BuildError>;

/// Sequences validation, resolution, generation and compilation.
pub struct BuildPipeline<'a> {
    toolchain: &'a dyn Toolchain,
    quiet: bool,
    temp_root: Option<Utf8PathBuf>,
}

impl<'a> BuildPipeline<'a> {
    /// A pipeline compiling with `toolchain`.
    #[must_use]
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self {
            toolchain,
            quiet: false,
            temp_root: None,
        }
    }

    /// Suppress progress output.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Allocate default output directories under `root` instead of the
    /// system temporary directory.
    #[must_use]
    pub fn temp_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Build the distribution described by `config`.
    ///
    /// # Errors
    ///
    /// See [`BuildPipeline::run_distribution`].
    pub fn run(
        &self,
        config: &BuilderConfig,
        cancel: &CancellationToken,
        stderr: &mut dyn Write,
    ) -> BuildOutcome {
        self.run_distribution(&config.distribution, &config.components(), cancel, stderr)
    }

    /// Build `distribution` from the requested `entries`.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] of the first failing stage.
    pub fn run_distribution(
        &self,
        distribution: &Distribution,
        entries: &[ComponentEntry],
        cancel: &CancellationToken,
        stderr: &mut dyn Write,
    ) -> BuildOutcome {
        validate(distribution)?;
        let manifest = resolve_distribution(distribution, entries)?;

        let output_dir = self.prepare_output_dir(distribution.output_path.as_deref())?;
        info!("building {} in {output_dir}", distribution.name);
        for warning in &manifest.warnings {
            self.progress(stderr, format!("warning: {warning}"));
        }

        self.progress(
            stderr,
            format!(
                "Generating {} ({} module(s)) in {output_dir}...",
                distribution.name,
                manifest.entries.len()
            ),
        );
        let generation = generate(distribution, &manifest, &output_dir)?;

        if !distribution.skip_compilation {
            self.progress(
                stderr,
                format!("Compiling {} with {}...", distribution.name, distribution.go_binary()),
            );
        }
        let options = CompileOptions {
            name: distribution.name.clone(),
            skip: distribution.skip_compilation,
        };
        let binary = compile(&generation, self.toolchain, &options, cancel)?;

        Ok(BuildArtifact {
            output_dir,
            generation,
            warnings: manifest.warnings,
            binary,
        })
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }

    /// The configured output directory, or a fresh temporary one that
    /// outlives the run.
    fn prepare_output_dir(
        &self,
        configured: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, BuildError> {
        if let Some(path) = configured {
            return Ok(path.to_owned());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let temp = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|source| BuildError::OutputDir { source })?;

        Utf8PathBuf::try_from(temp.keep()).map_err(|err| BuildError::OutputDir {
            source: err.into_io_error(),
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
