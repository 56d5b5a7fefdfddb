//! Resolved dependency manifest.
//!
//! The manifest is the only input the code generator needs besides the
//! distribution. Its entries and replacements are sorted by import path so
//! identical requests always render identical files.

use crate::distribution::ComponentKind;
use crate::version::ModuleVersion;
use camino::Utf8PathBuf;
use std::fmt;

/// One resolved module requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Go module path.
    pub import_path: String,
    /// Canonical module version.
    pub version: ModuleVersion,
    /// Absolute local directory replacing the module.
    pub replacement: Option<Utf8PathBuf>,
    /// Registry slot, or `None` for a plain requirement.
    pub kind: Option<ComponentKind>,
    /// Go package that provides `NewFactory`.
    pub package: String,
    /// Explicit import alias.
    pub name: Option<String>,
    /// Whether this is the synthesised base collector requirement.
    pub base: bool,
}

/// A `replace` directive for the generated `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Module being replaced.
    pub import_path: String,
    /// Absolute local directory used instead.
    pub path: Utf8PathBuf,
}

/// A non-fatal finding recorded during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// A user entry named the base collector module and replaced the
    /// synthesised requirement.
    BaseOverridden {
        /// The base collector module path.
        import_path: String,
        /// Version the distribution asked for.
        requested: String,
        /// Version the user entry pinned instead.
        used: String,
    },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseOverridden {
                import_path,
                requested,
                used,
            } => write!(
                f,
                "component entry for {import_path} overrides the base collector \
                 (requested {requested}, using {used})"
            ),
        }
    }
}

/// The deduplicated, deterministically ordered dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    /// Go module path of the generated program.
    pub module: String,
    /// Every requirement, including the base collector, sorted by import path.
    pub entries: Vec<ManifestEntry>,
    /// Replace directives, sorted by import path.
    pub replacements: Vec<Replacement>,
    /// Findings that did not stop resolution.
    pub warnings: Vec<ResolutionWarning>,
}

impl DependencyManifest {
    /// The base collector requirement.
    #[must_use]
    pub fn base_entry(&self) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.base)
    }

    /// Entries registered in a factory slot, in manifest order.
    pub fn components(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(|entry| entry.kind.is_some())
    }

    /// Entries registered in the slot for `kind`, in manifest order.
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &ManifestEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.kind == Some(kind))
    }
}
