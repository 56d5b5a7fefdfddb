//! Source generation: renders the Go program for a resolved distribution.
//!
//! Rendering is pure and deterministic. [`render`] turns a distribution and
//! its manifest into file contents; [`generate`] hands those contents to the
//! [`writer`](crate::writer), which writes them all or none of them.
//!
//! # Sub-modules
//!
//! - [`alias`] - Go import aliases for registered components.
//! - [`templates`] - Text of `main.go`, `go.mod` and `components.go`.

pub mod alias;
pub mod templates;

use crate::distribution::Distribution;
use crate::error::GenerationError;
use crate::manifest::DependencyManifest;
use crate::writer::{FileSystem, StdFileSystem, write_files};
use alias::assign_aliases;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

pub use templates::{GENERATED_HEADER, GO_DIRECTIVE};

/// Entry point of the generated program.
pub const MAIN_FILE: &str = "main.go";

/// Module definition of the generated program.
pub const GO_MOD_FILE: &str = "go.mod";

/// Component registry of the generated program.
pub const COMPONENTS_FILE: &str = "components.go";

/// One rendered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: Utf8PathBuf,
    /// Full file contents.
    pub contents: String,
}

/// What [`generate`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Directory holding the generated sources.
    pub output_dir: Utf8PathBuf,
    /// Absolute paths of the written files, in write order.
    pub files: Vec<Utf8PathBuf>,
}

/// Render every source file of the distribution.
///
/// Files come back in a fixed order: `main.go`, `go.mod`, `components.go`.
/// Identical inputs always yield byte-identical output.
#[must_use]
pub fn render(distribution: &Distribution, manifest: &DependencyManifest) -> Vec<GeneratedFile> {
    let components = assign_aliases(manifest);
    debug!(
        "rendering {} with {} registered component(s)",
        distribution.name,
        components.len()
    );

    vec![
        GeneratedFile {
            path: Utf8PathBuf::from(MAIN_FILE),
            contents: templates::render_main(distribution, &components),
        },
        GeneratedFile {
            path: Utf8PathBuf::from(GO_MOD_FILE),
            contents: templates::render_go_mod(manifest),
        },
        GeneratedFile {
            path: Utf8PathBuf::from(COMPONENTS_FILE),
            contents: templates::render_components(distribution, &components),
        },
    ]
}

/// Render and write the sources into `output_dir`, creating it if needed.
///
/// # Errors
///
/// Returns a [`GenerationError`] when the directory cannot be created or a
/// file cannot be written. No generated file is left behind on failure.
pub fn generate(
    distribution: &Distribution,
    manifest: &DependencyManifest,
    output_dir: &Utf8Path,
) -> Result<GenerationResult, GenerationError> {
    generate_with(&StdFileSystem, distribution, manifest, output_dir)
}

/// [`generate`] against an arbitrary [`FileSystem`].
///
/// # Errors
///
/// See [`generate`].
pub fn generate_with(
    fs: &dyn FileSystem,
    distribution: &Distribution,
    manifest: &DependencyManifest,
    output_dir: &Utf8Path,
) -> Result<GenerationResult, GenerationError> {
    let files = render(distribution, manifest);
    let written = write_files(fs, output_dir, &files)?;
    info!("generated {} file(s) in {output_dir}", written.len());

    Ok(GenerationResult {
        output_dir: output_dir.to_owned(),
        files: written,
    })
}
