//! Error types for the distribution builder.
//!
//! Every pipeline stage owns a dedicated error enum. [`BuildError`] wraps them
//! so callers receive exactly one failure, tagged with the [`Stage`] that
//! produced it, and can map it to a distinguishable process exit status.

use crate::toolchain::ToolchainError;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// The pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Structural checks on the distribution.
    Validation,
    /// Normalisation of the component list into a manifest.
    Resolution,
    /// Rendering and writing of the generated sources.
    Generation,
    /// External dependency fetch (`go mod tidy`).
    Fetch,
    /// External compilation (`go build`).
    Compile,
}

impl Stage {
    /// Lower-case stage name used in diagnostics and log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Resolution => "resolution",
            Self::Generation => "generation",
            Self::Fetch => "fetch",
            Self::Compile => "compile",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A distribution field failed a structural check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The executable name is empty.
    #[error("invalid distribution name: the executable name must not be empty")]
    EmptyName,

    /// The executable name would escape the output directory.
    #[error("invalid distribution name {name:?}: path separators are not allowed")]
    NameHasSeparator {
        /// The rejected executable name.
        name: String,
    },

    /// The Go module path of the generated program is empty.
    #[error("invalid distribution module: the module path must not be empty")]
    EmptyModule,

    /// The distribution version is empty.
    #[error("invalid distribution version: the version must not be empty")]
    EmptyVersion,

    /// The output path exists but is not a directory.
    #[error("invalid output path {path}: not a directory")]
    OutputPathNotDirectory {
        /// The configured output path.
        path: Utf8PathBuf,
    },

    /// The output path is neither a writable directory nor creatable.
    #[error("invalid output path {path}: {reason}")]
    OutputPathNotWritable {
        /// The configured output path.
        path: Utf8PathBuf,
        /// Why the path cannot be written to.
        reason: String,
    },

    /// No base collector version was configured.
    #[error("invalid otelcol version: the base collector version must not be empty")]
    EmptyOtelColVersion,
}

impl ValidationError {
    /// Name of the distribution field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameHasSeparator { .. } => "name",
            Self::EmptyModule => "module",
            Self::EmptyVersion => "version",
            Self::OutputPathNotDirectory { .. } | Self::OutputPathNotWritable { .. } => {
                "output_path"
            }
            Self::EmptyOtelColVersion => "otelcol_version",
        }
    }
}

/// The requested component set cannot be turned into a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// One or more import paths were requested more than once.
    #[error("duplicate component entries: {}", .paths.join(", "))]
    DuplicateEntries {
        /// Every offending import path, sorted.
        paths: Vec<String>,
    },

    /// A component entry has no import path.
    #[error("component entry #{index} has an empty import path")]
    EmptyImportPath {
        /// Position of the entry in the requested list.
        index: usize,
    },

    /// A replacement path does not point at a local directory.
    #[error("replacement path {path} for {import_path} not found: {reason}")]
    MissingReplacement {
        /// Import path of the offending entry.
        import_path: String,
        /// The configured replacement path.
        path: Utf8PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A component entry has no version.
    #[error("component {import_path} has an empty version")]
    EmptyVersion {
        /// Import path of the offending entry.
        import_path: String,
    },

    /// A version is neither a tagged semantic version nor a pseudo-version.
    #[error("component {import_path} has a malformed version {version:?}")]
    MalformedVersion {
        /// Import path of the offending entry.
        import_path: String,
        /// The rejected version string.
        version: String,
    },

    /// The built-in version grammar could not be compiled.
    #[error("cannot check versions: {reason}")]
    VersionGrammar {
        /// The pattern compile error.
        reason: String,
    },
}

/// Writing the generated sources failed.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}")]
    CreateDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A generated file could not be written.
    #[error("failed to write generated file {path}")]
    Write {
        /// The file that could not be written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The single failure reported by a pipeline run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The distribution failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The component list failed resolution.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The default output directory could not be allocated.
    #[error("failed to prepare output directory")]
    OutputDir {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The generated sources could not be written.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// `go mod tidy` exited unsuccessfully.
    #[error("dependency fetch failed ({})\n{stderr}", describe_status(.status.as_ref()))]
    FetchFailed {
        /// Exit code of the toolchain process, if it exited normally.
        status: Option<i32>,
        /// Raw standard output of the toolchain.
        stdout: String,
        /// Raw standard error of the toolchain.
        stderr: String,
    },

    /// `go build` exited unsuccessfully.
    #[error("compilation failed ({})\n{stderr}", describe_status(.status.as_ref()))]
    CompileFailed {
        /// Exit code of the toolchain process, if it exited normally.
        status: Option<i32>,
        /// Raw standard output of the toolchain.
        stdout: String,
        /// Raw standard error of the toolchain.
        stderr: String,
    },

    /// The toolchain process could not be run to completion.
    #[error("{stage} phase could not run")]
    Toolchain {
        /// The phase that was running.
        stage: Stage,
        /// The underlying toolchain failure.
        #[source]
        source: ToolchainError,
    },

    /// The caller cancelled the run while a toolchain phase was in flight.
    #[error("build cancelled during {stage} phase")]
    Cancelled {
        /// The phase that was interrupted.
        stage: Stage,
    },
}

impl BuildError {
    /// The pipeline stage that produced this failure.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Validation,
            Self::Resolution(_) => Stage::Resolution,
            Self::OutputDir { .. } | Self::Generation(_) => Stage::Generation,
            Self::FetchFailed { .. } => Stage::Fetch,
            Self::CompileFailed { .. } => Stage::Compile,
            Self::Toolchain { stage, .. } | Self::Cancelled { stage } => *stage,
        }
    }

    /// Process exit status the CLI reports for this failure.
    ///
    /// Each stage maps to its own non-zero code so scripts can tell a bad
    /// configuration apart from a toolchain failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if matches!(self, Self::Cancelled { .. }) {
            return 130;
        }
        match self.stage() {
            Stage::Validation => 2,
            Stage::Resolution => 3,
            Stage::Generation => 4,
            Stage::Fetch => 5,
            Stage::Compile => 6,
        }
    }
}

fn describe_status(status: Option<&i32>) -> String {
    status.map_or_else(
        || "terminated by signal".to_owned(),
        |code| format!("exit status {code}"),
    )
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
