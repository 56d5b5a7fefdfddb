//! otelcol-builder CLI entrypoint.
//!
//! Loads the configuration, installs logging and the Ctrl-C handler, then
//! hands everything to the build pipeline. The process exit status tells the
//! failing stage apart.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use fs2::FileExt;
use log::{debug, warn};
use otelcol_builder::cancel::CancellationToken;
use otelcol_builder::cli::{BuildArgs, Cli, Command};
use otelcol_builder::config::{BaseDirs, ConfigError, SystemBaseDirs};
use otelcol_builder::error::BuildError;
use otelcol_builder::output::{failure_report, success_message, write_stderr_line};
use otelcol_builder::pipeline::BuildPipeline;
use otelcol_builder::toolchain::GoToolchain;
use std::fs::File;
use std::io::Write;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Exit status for failures outside the pipeline.
const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to lock output directory via {path}")]
    Lock {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.build);

    let exit_code = match cli.command {
        Some(Command::Version) => {
            print_version(&mut std::io::stdout());
            0
        }
        None => {
            let mut stderr = std::io::stderr();
            let cancel = CancellationToken::new();
            install_interrupt_handler(&cancel);
            let result = run(&cli.build, &SystemBaseDirs, &cancel, &mut stderr);
            exit_code_for_run_result(result, &mut stderr)
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(
    args: &BuildArgs,
    dirs: &dyn BaseDirs,
    cancel: &CancellationToken,
    stderr: &mut dyn Write,
) -> Result<(), RunError> {
    let config = args.resolve_config(dirs)?;
    let distribution = &config.distribution;

    let _lock = match &distribution.output_path {
        Some(output) => lock_output(output)?,
        None => None,
    };

    let toolchain = GoToolchain::new(distribution.go_binary());
    let artifact = BuildPipeline::new(&toolchain)
        .quiet(args.quiet)
        .run(&config, cancel, stderr)?;

    if !args.quiet {
        write_stderr_line(
            stderr,
            success_message(
                &distribution.name,
                artifact.binary.as_deref(),
                &artifact.output_dir,
            ),
        );
    }
    Ok(())
}

/// Path of the advisory lock guarding `output`.
fn lock_path(output: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}.lock", output.as_str().trim_end_matches('/')))
}

/// Exclusive claim on an output directory. The lock file is removed on drop.
#[derive(Debug)]
struct OutputLock {
    path: Utf8PathBuf,
    _file: File,
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!("failed to remove lock file {}: {err}", self.path);
        }
    }
}

/// Take an exclusive lock beside the output directory so concurrent builds
/// cannot interleave their writes. Skipped when the parent directory does not
/// exist yet, since nothing can have claimed it.
fn lock_output(output: &Utf8Path) -> Result<Option<OutputLock>, RunError> {
    let path = lock_path(output);
    let parent_exists = path
        .parent()
        .is_none_or(|parent| parent.as_str().is_empty() || parent.is_dir());
    if !parent_exists {
        debug!("not locking {output}: parent directory does not exist");
        return Ok(None);
    }

    let lock_error = |source| RunError::Lock {
        path: path.clone(),
        source,
    };
    let file = File::create(&path).map_err(lock_error)?;
    file.try_lock_exclusive().map_err(lock_error)?;
    debug!("locked {path}");
    Ok(Some(OutputLock { path, _file: file }))
}

fn install_interrupt_handler(cancel: &CancellationToken) {
    let trigger = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || trigger.cancel()) {
        warn!("failed to install Ctrl-C handler: {err}");
    }
}

fn init_logging(args: &BuildArgs) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_version(stdout: &mut dyn Write) {
    if writeln!(stdout, "otelcol-builder {}", env!("CARGO_PKG_VERSION")).is_err() {
        // Best-effort output; ignore write failures.
    }
}

fn exit_code_for_run_result(result: Result<(), RunError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(RunError::Build(err)) => {
            write_stderr_line(stderr, failure_report(&err));
            err.exit_code()
        }
        Err(err) => {
            write_stderr_line(stderr, format!("error: {}", chain(&err)));
            EXIT_FAILURE
        }
    }
}

fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}
