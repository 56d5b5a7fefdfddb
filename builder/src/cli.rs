//! CLI argument definitions for the distribution builder.
//!
//! Kept apart from the entrypoint so the binary stays focused on
//! orchestration. Flags override `OTELCOL_BUILDER_*` environment variables,
//! which override values from the configuration file, which override the
//! built-in defaults.

use crate::config::{
    BaseDirs, BuilderConfig, ConfigError, DistributionOverrides, default_config_path,
};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Generate and compile a custom OpenTelemetry Collector distribution.
#[derive(Parser, Debug)]
#[command(name = "otelcol-builder")]
#[command(version, about)]
#[command(long_about = concat!(
    "Generate and compile a custom OpenTelemetry Collector distribution.\n\n",
    "The builder reads the distribution and its components from a TOML file, ",
    "generates the Go sources for a collector that registers exactly those ",
    "components, and compiles them with the Go toolchain.\n\n",
    "Command-line flags override OTELCOL_BUILDER_* environment variables, ",
    "which override values from the configuration file.",
))]
#[command(after_help = concat!(
    "EXIT STATUS:\n",
    "  0    success\n",
    "  1    configuration or I/O error\n",
    "  2    invalid distribution\n",
    "  3    component resolution failed\n",
    "  4    source generation failed\n",
    "  5    go mod tidy failed\n",
    "  6    go build failed\n",
    "  130  cancelled\n\n",
    "EXAMPLES:\n",
    "  Build from the default configuration file:\n",
    "    $ otelcol-builder\n\n",
    "  Generate sources only, into a chosen directory:\n",
    "    $ otelcol-builder --config edge.toml --skip-compilation --output-path ./dist",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Build arguments (used when no subcommand is given).
    #[command(flatten)]
    pub build: BuildArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the builder version.
    Version,
}

/// Arguments for a build.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    /// Configuration file [default: $HOME/.otelcol-builder.toml].
    #[arg(long, value_name = "FILE", env = "OTELCOL_BUILDER_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Generate sources without compiling them.
    #[arg(long, env = "OTELCOL_BUILDER_SKIP_COMPILATION")]
    pub skip_compilation: bool,

    /// Executable name of the distribution.
    #[arg(long, value_name = "NAME", env = "OTELCOL_BUILDER_NAME")]
    pub name: Option<String>,

    /// Long name of the distribution.
    #[arg(long, value_name = "TEXT", env = "OTELCOL_BUILDER_DESCRIPTION")]
    pub description: Option<String>,

    /// Version of the distribution.
    #[arg(
        long = "dist-version",
        value_name = "VERSION",
        env = "OTELCOL_BUILDER_VERSION"
    )]
    pub dist_version: Option<String>,

    /// Register the base collector's default components.
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        require_equals = true,
        env = "OTELCOL_BUILDER_INCLUDE_CORE"
    )]
    pub include_core: Option<bool>,

    /// Version of the base collector to build against.
    #[arg(long, value_name = "VERSION", env = "OTELCOL_BUILDER_OTELCOL_VERSION")]
    pub otelcol_version: Option<String>,

    /// Directory for the generated sources and binary [default: a new
    /// temporary directory].
    #[arg(long, value_name = "DIR", env = "OTELCOL_BUILDER_OUTPUT_PATH")]
    pub output_path: Option<Utf8PathBuf>,

    /// Go binary to compile with [default: go on PATH].
    #[arg(long, value_name = "PATH", env = "OTELCOL_BUILDER_GO")]
    pub go: Option<Utf8PathBuf>,

    /// Go module path of the generated program.
    #[arg(long, value_name = "MODULE", env = "OTELCOL_BUILDER_MODULE")]
    pub module: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl BuildArgs {
    /// The distribution values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> DistributionOverrides {
        DistributionOverrides {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.dist_version.clone(),
            module: self.module.clone(),
            otelcol_version: self.otelcol_version.clone(),
            include_core: self.include_core,
            output_path: self.output_path.clone(),
            go: self.go.clone(),
            skip_compilation: self.skip_compilation,
        }
    }

    /// Load the configuration file and apply the command-line overrides.
    ///
    /// An explicit `--config` file must exist. The default file is optional.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a file cannot be read or parsed.
    pub fn resolve_config(&self, dirs: &dyn BaseDirs) -> Result<BuilderConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => BuilderConfig::load(path)?,
            None => match default_config_path(dirs) {
                Some(path) => BuilderConfig::load_or_default(&path)?,
                None => BuilderConfig::default(),
            },
        };
        config.apply(&self.overrides());
        Ok(config)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
