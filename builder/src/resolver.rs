//! Module resolution: from the raw component list to a manifest.
//!
//! The resolver only deduplicates and normalises the explicit request. The
//! transitive dependency graph is left to `go mod tidy` in the compile phase.

use crate::distribution::{BASE_COLLECTOR_MODULE, ComponentEntry, Distribution};
use crate::error::ResolutionError;
use crate::manifest::{DependencyManifest, ManifestEntry, Replacement, ResolutionWarning};
use crate::version::{ModuleVersion, VersionError};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::thread;

/// Entry lists at or below this size are checked on the calling thread.
const PARALLEL_THRESHOLD: usize = 16;

/// Result type alias using [`ResolutionError`].
pub type Result<T> = std::result::Result<T, ResolutionError>;

/// Resolve the components requested for `distribution`.
///
/// # Errors
///
/// See [`resolve`].
pub fn resolve_distribution(
    distribution: &Distribution,
    entries: &[ComponentEntry],
) -> Result<DependencyManifest> {
    resolve(&distribution.module, entries, &distribution.otelcol_version)
}

/// Build the dependency manifest for `module` from the requested entries.
///
/// The base collector at `base_version` is always part of the result. When a
/// user entry names the base collector module its version and replacement
/// win, and a [`ResolutionWarning::BaseOverridden`] is recorded.
///
/// # Errors
///
/// - [`ResolutionError::EmptyImportPath`] for an entry without a path.
/// - [`ResolutionError::DuplicateEntries`] listing every repeated path.
/// - [`ResolutionError::MissingReplacement`] when a replacement directory
///   does not exist.
/// - [`ResolutionError::EmptyVersion`] or [`ResolutionError::MalformedVersion`]
///   for an unusable version, including the base version.
pub fn resolve(
    module: &str,
    entries: &[ComponentEntry],
    base_version: &str,
) -> Result<DependencyManifest> {
    reject_empty_import_paths(entries)?;
    reject_duplicates(entries)?;

    let base = base_entry(base_version)?;
    let mut resolved = collect_checked(entries)?;
    let mut warnings = Vec::new();

    match resolved
        .iter_mut()
        .find(|entry| entry.import_path == BASE_COLLECTOR_MODULE)
    {
        Some(user_entry) => {
            let warning = ResolutionWarning::BaseOverridden {
                import_path: BASE_COLLECTOR_MODULE.to_owned(),
                requested: base.version.to_string(),
                used: user_entry.version.to_string(),
            };
            warn!("{warning}");
            user_entry.base = true;
            warnings.push(warning);
        }
        None => resolved.push(base),
    }

    resolved.sort_by(|a, b| a.import_path.cmp(&b.import_path));

    let replacements = resolved
        .iter()
        .filter_map(|entry| {
            entry.replacement.as_ref().map(|path| Replacement {
                import_path: entry.import_path.clone(),
                path: path.clone(),
            })
        })
        .collect();

    info!(
        "resolved {} module(s) for {module} ({} requested)",
        resolved.len(),
        entries.len()
    );

    Ok(DependencyManifest {
        module: module.trim().to_owned(),
        entries: resolved,
        replacements,
        warnings,
    })
}

fn reject_empty_import_paths(entries: &[ComponentEntry]) -> Result<()> {
    match entries
        .iter()
        .position(|entry| entry.import_path.trim().is_empty())
    {
        Some(index) => Err(ResolutionError::EmptyImportPath { index }),
        None => Ok(()),
    }
}

fn reject_duplicates(entries: &[ComponentEntry]) -> Result<()> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.import_path.trim()).or_default() += 1;
    }

    let paths: Vec<String> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(path, _)| path.to_owned())
        .collect();

    if paths.is_empty() {
        Ok(())
    } else {
        Err(ResolutionError::DuplicateEntries { paths })
    }
}

fn base_entry(base_version: &str) -> Result<ManifestEntry> {
    let version = parse_version(BASE_COLLECTOR_MODULE, base_version)?;
    Ok(ManifestEntry {
        import_path: BASE_COLLECTOR_MODULE.to_owned(),
        version,
        replacement: None,
        kind: None,
        package: BASE_COLLECTOR_MODULE.to_owned(),
        name: None,
        base: true,
    })
}

/// Outcome of the independent per-entry checks.
struct EntryCheck<'a> {
    entry: &'a ComponentEntry,
    import_path: String,
    replacement: Result<Option<Utf8PathBuf>>,
    version: Result<ModuleVersion>,
}

impl EntryCheck<'_> {
    fn into_manifest_entry(self) -> Result<ManifestEntry> {
        Ok(ManifestEntry {
            package: non_blank(self.entry.package.as_deref())
                .unwrap_or(&self.import_path)
                .to_owned(),
            name: non_blank(self.entry.name.as_deref()).map(str::to_owned),
            kind: self.entry.kind,
            replacement: self.replacement?,
            version: self.version?,
            import_path: self.import_path,
            base: false,
        })
    }
}

/// Check every entry, then report failures in a fixed order: replacement
/// failures before version failures, each in import-path order.
fn collect_checked(entries: &[ComponentEntry]) -> Result<Vec<ManifestEntry>> {
    let mut checks = check_all(entries);
    checks.sort_by(|a, b| a.import_path.cmp(&b.import_path));

    if let Some(Err(err)) = checks.iter().map(|c| &c.replacement).find(|r| r.is_err()) {
        return Err(err.clone());
    }
    if let Some(Err(err)) = checks.iter().map(|c| &c.version).find(|r| r.is_err()) {
        return Err(err.clone());
    }

    checks
        .into_iter()
        .map(EntryCheck::into_manifest_entry)
        .collect()
}

fn check_all(entries: &[ComponentEntry]) -> Vec<EntryCheck<'_>> {
    if entries.len() <= PARALLEL_THRESHOLD {
        return entries.iter().map(check_entry).collect();
    }

    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let chunk_size = entries.len().div_ceil(workers).max(1);

    thread::scope(|scope| {
        let handles: Vec<_> = entries
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(check_entry).collect::<Vec<_>>()))
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

fn check_entry(entry: &ComponentEntry) -> EntryCheck<'_> {
    let import_path = entry.import_path.trim().to_owned();
    debug!("checking component {import_path}");

    let replacement = entry
        .path
        .as_deref()
        .map(|path| locate_replacement(&import_path, path))
        .transpose();
    let version = parse_version(&import_path, &entry.version);

    EntryCheck {
        entry,
        import_path,
        replacement,
        version,
    }
}

fn locate_replacement(import_path: &str, path: &Utf8Path) -> Result<Utf8PathBuf> {
    let missing = |reason: String| ResolutionError::MissingReplacement {
        import_path: import_path.to_owned(),
        path: path.to_owned(),
        reason,
    };

    let canonical = path.canonicalize_utf8().map_err(|e| missing(e.to_string()))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(missing("not a directory".to_owned()))
    }
}

fn parse_version(import_path: &str, version: &str) -> Result<ModuleVersion> {
    ModuleVersion::parse(version).map_err(|err| match err {
        VersionError::Empty => ResolutionError::EmptyVersion {
            import_path: import_path.to_owned(),
        },
        VersionError::Malformed(version) => ResolutionError::MalformedVersion {
            import_path: import_path.to_owned(),
            version,
        },
        VersionError::Grammar(reason) => ResolutionError::VersionGrammar { reason },
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests;
