//! Deterministic Go import aliases for registered components.

use crate::manifest::{DependencyManifest, ManifestEntry};
use std::collections::BTreeSet;

/// Identifiers the templates declare themselves, plus Go keywords.
const RESERVED: &[&str] = &[
    "app",
    "break",
    "case",
    "chan",
    "component",
    "components",
    "const",
    "continue",
    "core",
    "default",
    "defaultcomponents",
    "defer",
    "else",
    "err",
    "factories",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "info",
    "interface",
    "log",
    "main",
    "map",
    "package",
    "r",
    "range",
    "registeredModules",
    "registry",
    "return",
    "select",
    "service",
    "struct",
    "switch",
    "type",
    "var",
];

/// A registered component together with the alias it is imported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasedComponent<'a> {
    /// The manifest entry.
    pub entry: &'a ManifestEntry,
    /// Go identifier the package is imported as.
    pub alias: String,
}

/// Assign an alias to every registered component, in manifest order.
///
/// Explicit names are sanitised like derived ones. Collisions get a numeric
/// suffix starting at 2, so the first entry in import-path order keeps the
/// plain alias.
#[must_use]
pub fn assign_aliases(manifest: &DependencyManifest) -> Vec<AliasedComponent<'_>> {
    let mut taken: BTreeSet<String> = RESERVED.iter().map(|&s| s.to_owned()).collect();

    manifest
        .components()
        .map(|entry| {
            let base = entry
                .name
                .as_deref()
                .map_or_else(|| derive_alias(&entry.package), sanitise);
            let alias = claim(&mut taken, &base);
            AliasedComponent { entry, alias }
        })
        .collect()
}

fn claim(taken: &mut BTreeSet<String>, base: &str) -> String {
    let alias = if taken.contains(base) {
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| base.to_owned())
    } else {
        base.to_owned()
    };
    taken.insert(alias.clone());
    alias
}

/// Alias from a package path: its last segment, or the one before a `/vN`
/// major-version suffix.
fn derive_alias(package: &str) -> String {
    let segments: Vec<&str> = package.split('/').filter(|s| !s.is_empty()).collect();
    let last = match segments.as_slice() {
        [.., previous, last] if is_major_suffix(last) => *previous,
        [.., last] => *last,
        [] => "",
    };
    sanitise(last)
}

fn is_major_suffix(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

fn sanitise(raw: &str) -> String {
    let ident: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase();

    if ident.is_empty() {
        "module".to_owned()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("m{ident}")
    } else {
        ident
    }
}
