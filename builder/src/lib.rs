//! OpenTelemetry Collector distribution builder.
//!
//! This crate turns a declarative list of collector components into a custom
//! collector executable. It validates the distribution, resolves the
//! requested Go modules into a deterministic manifest, generates the Go glue
//! sources and drives the Go toolchain to compile them. It is used by the
//! `otelcol-builder` CLI binary and can be driven programmatically through
//! [`pipeline::BuildPipeline`].
//!
//! # Modules
//!
//! - [`cancel`] - Cancellation token shared with signal handlers
//! - [`cli`] - Command-line argument definitions
//! - [`compile`] - Fetch and compile orchestration
//! - [`config`] - TOML configuration and command-line overrides
//! - [`distribution`] - Distribution and component entry model
//! - [`error`] - Per-stage error types and exit statuses
//! - [`generator`] - Go source rendering
//! - [`manifest`] - Resolved dependency manifest
//! - [`output`] - Progress and diagnostic text
//! - [`pipeline`] - Stage sequencing, the entry point for callers
//! - [`resolver`] - Component list normalisation
//! - [`toolchain`] - The Go toolchain seam
//! - [`validation`] - Structural distribution checks
//! - [`version`] - Go module version grammar
//! - [`writer`] - All-or-nothing file writing

pub mod cancel;
pub mod cli;
pub mod compile;
pub mod config;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod toolchain;
pub mod validation;
pub mod version;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
