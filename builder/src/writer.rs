//! All-or-nothing writing of generated files.
//!
//! The writer goes through the [`FileSystem`] trait so failures can be
//! injected in tests. Every directory it creates and every file it writes is
//! recorded; when a write fails, the recorded items are removed again before
//! the error is returned.

use crate::error::GenerationError;
use crate::generator::GeneratedFile;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::io;

/// Filesystem operations used by the writer.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// Whether `path` exists.
    fn exists(&self, path: &Utf8Path) -> bool;
    /// Create a single directory whose parent already exists.
    fn create_dir(&self, path: &Utf8Path) -> io::Result<()>;
    /// Create or truncate `path` and write `contents` to it.
    fn write(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()>;
    /// Remove a file.
    fn remove_file(&self, path: &Utf8Path) -> io::Result<()>;
    /// Remove an empty directory.
    fn remove_dir(&self, path: &Utf8Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Utf8Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn remove_file(&self, path: &Utf8Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Utf8Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}

/// What a write attempt has changed so far.
#[derive(Debug, Default)]
struct Changes {
    dirs: Vec<Utf8PathBuf>,
    files: Vec<Utf8PathBuf>,
}

/// Write `files` below `output_dir`, creating missing directories.
///
/// Returns the absolute paths written, in order.
///
/// # Errors
///
/// Returns [`GenerationError::CreateDir`] or [`GenerationError::Write`] for
/// the first failure, after removing every file written and every directory
/// created by this call.
pub fn write_files(
    fs: &dyn FileSystem,
    output_dir: &Utf8Path,
    files: &[GeneratedFile],
) -> Result<Vec<Utf8PathBuf>, GenerationError> {
    let mut changes = Changes::default();

    match write_all(fs, output_dir, files, &mut changes) {
        Ok(()) => Ok(changes.files),
        Err(err) => {
            roll_back(fs, changes);
            Err(err)
        }
    }
}

fn write_all(
    fs: &dyn FileSystem,
    output_dir: &Utf8Path,
    files: &[GeneratedFile],
    changes: &mut Changes,
) -> Result<(), GenerationError> {
    ensure_dir(fs, output_dir, changes)?;

    for file in files {
        let target = output_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            ensure_dir(fs, parent, changes)?;
        }

        // A failed write may still have created or truncated the target.
        debug!("writing {target}");
        changes.files.push(target.clone());
        fs.write(&target, file.contents.as_bytes())
            .map_err(|source| GenerationError::Write {
                path: target,
                source,
            })?;
    }

    Ok(())
}

/// Create `dir` and any missing ancestors, shallowest first.
fn ensure_dir(
    fs: &dyn FileSystem,
    dir: &Utf8Path,
    changes: &mut Changes,
) -> Result<(), GenerationError> {
    let mut missing: Vec<&Utf8Path> = dir
        .ancestors()
        .filter(|candidate| !candidate.as_str().is_empty())
        .take_while(|candidate| !fs.exists(candidate))
        .collect();
    missing.reverse();

    for path in missing {
        fs.create_dir(path)
            .map_err(|source| GenerationError::CreateDir {
                path: path.to_owned(),
                source,
            })?;
        changes.dirs.push(path.to_owned());
    }

    Ok(())
}

/// Undo `changes`: files first, then directories deepest first.
fn roll_back(fs: &dyn FileSystem, changes: Changes) {
    for file in changes.files.iter().rev() {
        match fs.remove_file(file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove {file} during rollback: {err}"),
        }
    }
    for dir in changes.dirs.iter().rev() {
        if let Err(err) = fs.remove_dir(dir) {
            warn!("failed to remove {dir} during rollback: {err}");
        }
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
