//! Go module version grammar.
//!
//! Accepts canonical semantic versions (`v1.2.3`, `v1.2.3-rc.1`,
//! `v2.0.0+incompatible`) and pseudo-versions
//! (`v0.0.0-20210603123456-abcdef123456`). A missing leading `v` is added.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

const SEMVER_PATTERN: &str = concat!(
    r"^v(?:0|[1-9][0-9]*)\.(?:0|[1-9][0-9]*)\.(?:0|[1-9][0-9]*)",
    r"(?:-(?:0|[1-9][0-9]*|[0-9]*[A-Za-z-][0-9A-Za-z-]*)",
    r"(?:\.(?:0|[1-9][0-9]*|[0-9]*[A-Za-z-][0-9A-Za-z-]*))*)?",
    r"(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
);

const PSEUDO_PATTERN: &str = concat!(
    r"^v[0-9]+\.(?:0\.0-|[0-9]+\.[0-9]+-(?:[^+]*\.)?0\.)[0-9]{14}-[A-Za-z0-9]+",
    r"(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
);

/// Compiled version patterns.
struct Grammar {
    semver: Regex,
    pseudo: Regex,
}

impl Grammar {
    fn compile(semver: &str, pseudo: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            semver: Regex::new(semver)?,
            pseudo: Regex::new(pseudo)?,
        })
    }
}

static GRAMMAR: Lazy<Result<Grammar, regex::Error>> =
    Lazy::new(|| Grammar::compile(SEMVER_PATTERN, PSEUDO_PATTERN));

/// A version string could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Nothing but whitespace was supplied.
    #[error("version is empty")]
    Empty,
    /// The string is not a Go module version.
    #[error("version {0:?} is neither a semantic version nor a pseudo-version")]
    Malformed(String),
    /// The version grammar itself failed to compile.
    #[error("version grammar failed to compile: {0}")]
    Grammar(String),
}

/// How a version identifies a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    /// A released tag.
    Tagged,
    /// A timestamped commit reference generated by the Go toolchain.
    Pseudo,
}

/// A validated, canonical Go module version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleVersion(String);

impl ModuleVersion {
    /// Normalise and validate `input`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Empty`] for blank input and
    /// [`VersionError::Malformed`] for anything outside the grammar.
    /// [`VersionError::Grammar`] reports a pattern that does not compile.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let grammar = GRAMMAR
            .as_ref()
            .map_err(|err| VersionError::Grammar(err.to_string()))?;
        Self::parse_with(grammar, input)
    }

    fn parse_with(grammar: &Grammar, input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let canonical = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            format!("v{trimmed}")
        } else {
            trimmed.to_owned()
        };

        if grammar.semver.is_match(&canonical) {
            Ok(Self(canonical))
        } else {
            Err(VersionError::Malformed(trimmed.to_owned()))
        }
    }

    /// Whether this is a tag or a pseudo-version.
    #[must_use]
    pub fn kind(&self) -> VersionKind {
        // A `ModuleVersion` only exists once the grammar has compiled.
        if GRAMMAR
            .as_ref()
            .is_ok_and(|grammar| grammar.pseudo.is_match(&self.0))
        {
            VersionKind::Pseudo
        } else {
            VersionKind::Tagged
        }
    }

    /// The canonical version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn patterns_compile() {
        assert!(GRAMMAR.is_ok());
    }

    #[test]
    fn broken_grammar_is_reported() {
        let err = Grammar::compile(SEMVER_PATTERN, "(unclosed")
            .err()
            .expect("pattern must not compile");
        let wrapped = VersionError::Grammar(err.to_string());

        let message = wrapped.to_string();
        assert!(message.starts_with("version grammar failed to compile: "));
        assert!(message.contains("unclosed"), "{message}");
    }

    #[rstest]
    #[case::tag("v1.0.0", "v1.0.0", VersionKind::Tagged)]
    #[case::bare("0.29.0", "v0.29.0", VersionKind::Tagged)]
    #[case::padded("  v1.2.3 ", "v1.2.3", VersionKind::Tagged)]
    #[case::prerelease("v1.0.0-rc.1", "v1.0.0-rc.1", VersionKind::Tagged)]
    #[case::incompatible("v2.0.0+incompatible", "v2.0.0+incompatible", VersionKind::Tagged)]
    #[case::pseudo_zero(
        "v0.0.0-20210603123456-abcdef123456",
        "v0.0.0-20210603123456-abcdef123456",
        VersionKind::Pseudo
    )]
    #[case::pseudo_patch(
        "v1.2.4-0.20210603123456-abcdef123456",
        "v1.2.4-0.20210603123456-abcdef123456",
        VersionKind::Pseudo
    )]
    #[case::pseudo_prerelease(
        "v1.3.0-rc.1.0.20210603123456-abcdef123456",
        "v1.3.0-rc.1.0.20210603123456-abcdef123456",
        VersionKind::Pseudo
    )]
    fn accepts_go_versions(#[case] input: &str, #[case] canonical: &str, #[case] kind: VersionKind) {
        let version = ModuleVersion::parse(input).expect("version should parse");
        assert_eq!(version.as_str(), canonical);
        assert_eq!(version.kind(), kind);
    }

    #[rstest]
    #[case::latest("latest")]
    #[case::short("v1.0")]
    #[case::leading_zero("v01.0.0")]
    #[case::branch("main")]
    #[case::space_inside("v1.0.0 beta")]
    fn rejects_malformed_versions(#[case] input: &str) {
        assert!(matches!(
            ModuleVersion::parse(input),
            Err(VersionError::Malformed(_))
        ));
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn rejects_empty_versions(#[case] input: &str) {
        assert_eq!(ModuleVersion::parse(input), Err(VersionError::Empty));
    }
}
