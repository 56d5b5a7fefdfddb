//! Tests for module resolution.

use super::*;
use crate::distribution::ComponentKind;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const MODULE: &str = "example.com/custom";
const BASE: &str = "v1.2.3";

fn entry(path: &str, version: &str) -> ComponentEntry {
    ComponentEntry::new(path, version)
}

fn import_paths(manifest: &DependencyManifest) -> Vec<&str> {
    manifest
        .entries
        .iter()
        .map(|e| e.import_path.as_str())
        .collect()
}

/// A temporary directory usable as a replacement path.
struct LocalModule {
    _temp: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn local_module() -> LocalModule {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
    LocalModule { _temp: temp, path }
}

#[test]
fn sorts_entries_by_import_path() {
    let entries = vec![entry("b/mod", "v2.0.0"), entry("a/mod", "v1.0.0")];

    let manifest = resolve(MODULE, &entries, BASE).expect("resolution should succeed");

    assert_eq!(
        import_paths(&manifest),
        ["a/mod", "b/mod", BASE_COLLECTOR_MODULE]
    );
    assert_eq!(manifest.entries[0].version.as_str(), "v1.0.0");
    assert_eq!(manifest.entries[1].version.as_str(), "v2.0.0");
}

#[test]
fn always_includes_base_collector() {
    let manifest = resolve(MODULE, &[], BASE).expect("resolution should succeed");

    let base = manifest.base_entry().expect("base entry present");
    assert_eq!(base.import_path, BASE_COLLECTOR_MODULE);
    assert_eq!(base.version.as_str(), "v1.2.3");
    assert!(base.kind.is_none());
    assert!(manifest.warnings.is_empty());
    assert_eq!(manifest.module, MODULE);
}

#[test]
fn rejects_duplicates_naming_every_path() {
    let entries = vec![
        entry("b/mod", "v1.0.0"),
        entry("a/mod", "v1.0.0"),
        entry("b/mod", "v2.0.0"),
        entry("a/mod", "v1.1.0"),
        entry("c/mod", "v1.0.0"),
    ];

    let err = resolve(MODULE, &entries, BASE).expect_err("duplicates must fail");

    assert_eq!(
        err,
        ResolutionError::DuplicateEntries {
            paths: vec!["a/mod".to_owned(), "b/mod".to_owned()],
        }
    );
}

#[test]
fn duplicates_across_kinds_are_rejected() {
    let entries = vec![
        entry("example.com/otlp", "v1.0.0").with_kind(ComponentKind::Receiver),
        entry("example.com/otlp", "v1.0.0").with_kind(ComponentKind::Exporter),
    ];

    let err = resolve(MODULE, &entries, BASE).expect_err("duplicates must fail");

    assert!(matches!(err, ResolutionError::DuplicateEntries { paths } if paths == ["example.com/otlp"]));
}

#[test]
fn whitespace_does_not_hide_duplicates() {
    let entries = vec![entry("a/mod", "v1.0.0"), entry(" a/mod ", "v1.0.0")];

    let err = resolve(MODULE, &entries, BASE).expect_err("duplicates must fail");

    assert!(matches!(err, ResolutionError::DuplicateEntries { .. }));
}

#[test]
fn rejects_empty_import_path() {
    let entries = vec![entry("a/mod", "v1.0.0"), entry("  ", "v1.0.0")];

    let err = resolve(MODULE, &entries, BASE).expect_err("empty path must fail");

    assert_eq!(err, ResolutionError::EmptyImportPath { index: 1 });
}

#[rstest]
#[case::empty("", true)]
#[case::latest("latest", false)]
#[case::short("v1", false)]
fn rejects_unusable_versions(#[case] version: &str, #[case] expect_empty: bool) {
    let entries = vec![entry("a/mod", version)];

    let err = resolve(MODULE, &entries, BASE).expect_err("bad version must fail");

    if expect_empty {
        assert_eq!(
            err,
            ResolutionError::EmptyVersion {
                import_path: "a/mod".to_owned()
            }
        );
    } else {
        assert!(matches!(
            err,
            ResolutionError::MalformedVersion { import_path, .. } if import_path == "a/mod"
        ));
    }
}

#[test]
fn rejects_malformed_base_version() {
    let err = resolve(MODULE, &[], "not-a-version").expect_err("bad base must fail");

    assert!(matches!(
        err,
        ResolutionError::MalformedVersion { import_path, .. } if import_path == BASE_COLLECTOR_MODULE
    ));
}

#[test]
fn normalises_pseudo_and_bare_versions() {
    let entries = vec![
        entry("a/mod", "v0.0.0-20210603123456-abcdef123456"),
        entry("b/mod", "1.4.0"),
    ];

    let manifest = resolve(MODULE, &entries, "0.29.0").expect("resolution should succeed");

    assert_eq!(
        manifest.entries[0].version.as_str(),
        "v0.0.0-20210603123456-abcdef123456"
    );
    assert_eq!(manifest.entries[1].version.as_str(), "v1.4.0");
    assert_eq!(
        manifest.base_entry().map(|b| b.version.as_str()),
        Some("v0.29.0")
    );
}

#[rstest]
fn replacement_is_canonicalised(local_module: LocalModule) {
    let entries = vec![entry("a/mod", "v1.0.0").with_replacement(local_module.path.clone())];

    let manifest = resolve(MODULE, &entries, BASE).expect("resolution should succeed");

    let expected = local_module
        .path
        .canonicalize_utf8()
        .expect("temp dir canonicalises");
    assert_eq!(manifest.entries[0].replacement.as_ref(), Some(&expected));
    assert_eq!(manifest.replacements.len(), 1);
    assert_eq!(manifest.replacements[0].import_path, "a/mod");
    assert_eq!(manifest.replacements[0].path, expected);
}

#[rstest]
fn rejects_missing_replacement(local_module: LocalModule) {
    let missing = local_module.path.join("does-not-exist");
    let entries = vec![entry("a/mod", "v1.0.0").with_replacement(missing.clone())];

    let err = resolve(MODULE, &entries, BASE).expect_err("missing path must fail");

    assert!(matches!(
        err,
        ResolutionError::MissingReplacement { import_path, path, .. }
            if import_path == "a/mod" && path == missing
    ));
}

#[rstest]
fn replacement_failures_are_reported_before_version_failures(local_module: LocalModule) {
    let entries = vec![
        entry("a/mod", "garbage"),
        entry("b/mod", "v1.0.0").with_replacement(local_module.path.join("gone")),
    ];

    let err = resolve(MODULE, &entries, BASE).expect_err("resolution must fail");

    assert!(matches!(err, ResolutionError::MissingReplacement { import_path, .. } if import_path == "b/mod"));
}

#[rstest]
fn user_entry_overrides_base_with_warning(local_module: LocalModule) {
    let entries = vec![
        entry(BASE_COLLECTOR_MODULE, "v1.5.0").with_replacement(local_module.path.clone()),
        entry("a/mod", "v1.0.0"),
    ];

    let manifest = resolve(MODULE, &entries, BASE).expect("override is not an error");

    assert_eq!(import_paths(&manifest), ["a/mod", BASE_COLLECTOR_MODULE]);
    let base = manifest.base_entry().expect("base entry present");
    assert_eq!(base.version.as_str(), "v1.5.0");
    assert!(base.replacement.is_some());
    assert_eq!(
        manifest.warnings,
        vec![ResolutionWarning::BaseOverridden {
            import_path: BASE_COLLECTOR_MODULE.to_owned(),
            requested: "v1.2.3".to_owned(),
            used: "v1.5.0".to_owned(),
        }]
    );
}

#[test]
fn package_and_name_are_carried_over() {
    let entries = vec![
        entry("example.com/contrib", "v0.29.0")
            .with_kind(ComponentKind::Exporter)
            .with_package("example.com/contrib/exporter/fileexporter")
            .with_name(" fileexp "),
        entry("example.com/plain", "v1.0.0"),
    ];

    let manifest = resolve(MODULE, &entries, BASE).expect("resolution should succeed");

    let contrib = &manifest.entries[0];
    assert_eq!(contrib.package, "example.com/contrib/exporter/fileexporter");
    assert_eq!(contrib.name.as_deref(), Some("fileexp"));
    assert_eq!(contrib.kind, Some(ComponentKind::Exporter));

    let plain = &manifest.entries[1];
    assert_eq!(plain.package, "example.com/plain");
    assert!(plain.name.is_none());
    assert!(plain.kind.is_none());
}

#[test]
fn resolution_is_deterministic() {
    let entries = vec![
        entry("z/mod", "v1.0.0"),
        entry("m/mod", "v0.1.0"),
        entry("a/mod", "v3.0.0"),
    ];
    let mut reversed = entries.clone();
    reversed.reverse();

    let first = resolve(MODULE, &entries, BASE).expect("resolution should succeed");
    let second = resolve(MODULE, &entries, BASE).expect("resolution should succeed");
    let shuffled = resolve(MODULE, &reversed, BASE).expect("resolution should succeed");

    assert_eq!(first, second);
    assert_eq!(first, shuffled);
}

#[test]
fn large_requests_resolve_in_order() {
    let entries: Vec<_> = (0..100)
        .rev()
        .map(|i| entry(&format!("example.com/mod{i:03}"), "v1.0.0"))
        .collect();

    let manifest = resolve(MODULE, &entries, BASE).expect("resolution should succeed");

    let paths = import_paths(&manifest);
    let mut sorted = paths.clone();
    sorted.sort_unstable();
    assert_eq!(paths, sorted);
    assert_eq!(paths.len(), 101);
}

#[test]
fn large_requests_report_first_failure_in_path_order() {
    let mut entries: Vec<_> = (0..64)
        .map(|i| entry(&format!("example.com/mod{i:03}"), "v1.0.0"))
        .collect();
    entries[50].version = "bad".to_owned();
    entries[10].version = "worse".to_owned();

    let err = resolve(MODULE, &entries, BASE).expect_err("resolution must fail");

    assert!(matches!(
        err,
        ResolutionError::MalformedVersion { import_path, .. } if import_path == "example.com/mod010"
    ));
}

#[test]
fn resolve_distribution_uses_module_and_base_version() {
    let distribution = Distribution {
        module: "example.com/custom".to_owned(),
        otelcol_version: "v1.2.3".to_owned(),
        ..Distribution::default()
    };

    let manifest = resolve_distribution(&distribution, &[]).expect("resolution should succeed");

    assert_eq!(manifest.module, "example.com/custom");
    assert_eq!(
        manifest.base_entry().map(|b| b.version.as_str()),
        Some("v1.2.3")
    );
}
