//! Tests for the `go` process runner.
//!
//! A shell script stands in for `go`, so these run on Unix only.

#![cfg(unix)]

use super::*;
use rstest::{fixture, rstest};
use std::os::unix::fs::PermissionsExt;
use std::time::Instant;
use tempfile::TempDir;

struct FakeGo {
    _temp: TempDir,
    workdir: Utf8PathBuf,
    toolchain: GoToolchain,
}

/// Install `body` as an executable `go` script beside an empty workdir.
fn fake_go(body: &str) -> FakeGo {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_owned())
        .expect("non-UTF8 temp path")
        .canonicalize_utf8()
        .expect("temp dir canonicalises");

    let script = root.join("go");
    std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write fake go");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake go");

    let workdir = root.join("work");
    std::fs::create_dir(&workdir).expect("create workdir");

    FakeGo {
        _temp: temp,
        workdir,
        toolchain: GoToolchain::new(script),
    }
}

#[fixture]
fn echo_go() -> FakeGo {
    fake_go(r#"printf '%s|' "$@"; echo; pwd"#)
}

#[rstest]
fn fetch_runs_mod_tidy_in_workdir(echo_go: FakeGo) {
    let output = echo_go
        .toolchain
        .fetch(&echo_go.workdir, &CancellationToken::new())
        .expect("fetch should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, format!("mod|tidy|\n{}\n", echo_go.workdir));
}

#[rstest]
fn compile_builds_stripped_binary(echo_go: FakeGo) {
    let output = echo_go
        .toolchain
        .compile(&echo_go.workdir, "otelcol-custom", &CancellationToken::new())
        .expect("compile should run");

    assert!(output.status.success());
    assert!(
        output
            .stdout
            .starts_with("build|-trimpath|-ldflags=-s -w|-o|otelcol-custom|\n")
    );
}

#[test]
fn failing_exit_is_reported_with_diagnostics() {
    let go = fake_go("echo 'go: example.com/x@v9.9.9: unknown revision' >&2; exit 1");

    let output = go
        .toolchain
        .fetch(&go.workdir, &CancellationToken::new())
        .expect("process should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr.contains("unknown revision"));
}

#[test]
fn large_output_does_not_deadlock() {
    let go = fake_go("i=0; while [ $i -lt 20000 ]; do echo 'padding line for pipe capacity'; i=$((i+1)); done >&2");

    let output = go
        .toolchain
        .fetch(&go.workdir, &CancellationToken::new())
        .expect("process should run");

    assert!(output.status.success());
    assert_eq!(output.stderr.lines().count(), 20_000);
}

#[test]
fn missing_binary_is_a_spawn_error() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
    let toolchain = GoToolchain::new(root.join("no-such-go"));

    let err = toolchain
        .fetch(&root, &CancellationToken::new())
        .expect_err("spawn must fail");

    assert!(matches!(err, ToolchainError::Spawn { program, .. } if program.ends_with("no-such-go")));
}

#[test]
fn cancellation_kills_the_running_phase() {
    let go = fake_go("exec sleep 30");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let started = Instant::now();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        trigger.cancel();
    });

    let err = go
        .toolchain
        .compile(&go.workdir, "otelcol-custom", &cancel)
        .expect_err("phase must be cancelled");
    canceller.join().expect("canceller thread panicked");

    assert!(matches!(err, ToolchainError::Cancelled { .. }));
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "cancellation took {:?}",
        started.elapsed()
    );
}

#[test]
fn cancellation_kills_forked_workers() {
    let go = fake_go(r#"( sleep 2; touch "$PWD/worker-finished" ) & wait"#);
    let marker = go.workdir.join("worker-finished");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });

    let err = go
        .toolchain
        .compile(&go.workdir, "otelcol-custom", &cancel)
        .expect_err("phase must be cancelled");
    canceller.join().expect("canceller thread panicked");
    assert!(matches!(err, ToolchainError::Cancelled { .. }));

    thread::sleep(Duration::from_secs(3));
    assert!(!marker.exists(), "forked worker outlived cancellation");
}

#[test]
fn pre_cancelled_token_stops_immediately() {
    let go = fake_go("exec sleep 30");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let err = go
        .toolchain
        .fetch(&go.workdir, &cancel)
        .expect_err("phase must be cancelled");

    assert!(matches!(err, ToolchainError::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn default_uses_go_from_path() {
    assert_eq!(GoToolchain::default().go(), Utf8Path::new("go"));
}
