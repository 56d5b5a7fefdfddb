//! User-facing progress and summary text.

use crate::error::BuildError;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output.
    }
}

/// Summary printed after a successful build.
#[must_use]
pub fn success_message(name: &str, binary: Option<&Utf8Path>, output_dir: &Utf8Path) -> String {
    match binary {
        Some(binary) => format!("Built {name} at {binary}"),
        None => format!("Generated sources for {name} in {output_dir} (compilation skipped)"),
    }
}

/// The diagnostic printed for a failed build: one summary line naming the
/// stage, followed by the toolchain's own output when there is any.
#[must_use]
pub fn failure_report(err: &BuildError) -> String {
    let mut report = format!("error: {} stage failed: {}", err.stage(), headline(err));

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        report.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }

    if let BuildError::FetchFailed { stdout, stderr, .. }
    | BuildError::CompileFailed { stdout, stderr, .. } = err
    {
        for text in [stdout, stderr] {
            let text = text.trim_end();
            if !text.is_empty() {
                report.push('\n');
                report.push_str(text);
            }
        }
    }

    report
}

/// First line of the error's message; toolchain output is appended separately.
fn headline(err: &BuildError) -> String {
    let message = err.to_string();
    message.lines().next().unwrap_or_default().to_owned()
}
