//! Structural validation of a [`Distribution`].
//!
//! Runs before any side effect. The output path probes only read metadata;
//! nothing is created here.

use crate::distribution::Distribution;
use crate::error::ValidationError;
use camino::Utf8Path;

/// Check `distribution`, stopping at the first offending field.
///
/// Checks run in a fixed order: executable name, module path, output path,
/// base collector version, distribution version.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the offending field.
pub fn validate(distribution: &Distribution) -> Result<(), ValidationError> {
    validate_name(&distribution.name)?;

    if distribution.module.trim().is_empty() {
        return Err(ValidationError::EmptyModule);
    }

    if let Some(output_path) = &distribution.output_path {
        validate_output_path(output_path)?;
    }

    if distribution.otelcol_version.trim().is_empty() {
        return Err(ValidationError::EmptyOtelColVersion);
    }

    if distribution.version.trim().is_empty() {
        return Err(ValidationError::EmptyVersion);
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ValidationError::NameHasSeparator {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// An existing path must be a writable directory. A missing path must have
/// a writable directory as its nearest existing ancestor.
fn validate_output_path(path: &Utf8Path) -> Result<(), ValidationError> {
    if path.exists() {
        return probe_directory(path, path);
    }

    let ancestor = path
        .ancestors()
        .skip(1)
        .map(|candidate| {
            if candidate.as_str().is_empty() {
                Utf8Path::new(".")
            } else {
                candidate
            }
        })
        .find(|candidate| candidate.exists())
        .ok_or_else(|| ValidationError::OutputPathNotWritable {
            path: path.to_owned(),
            reason: "no existing parent directory".to_owned(),
        })?;

    probe_directory(path, ancestor)
}

fn probe_directory(configured: &Utf8Path, dir: &Utf8Path) -> Result<(), ValidationError> {
    let metadata = dir
        .metadata()
        .map_err(|e| ValidationError::OutputPathNotWritable {
            path: configured.to_owned(),
            reason: e.to_string(),
        })?;

    if !metadata.is_dir() {
        return Err(if dir == configured {
            ValidationError::OutputPathNotDirectory {
                path: configured.to_owned(),
            }
        } else {
            ValidationError::OutputPathNotWritable {
                path: configured.to_owned(),
                reason: format!("{dir} is not a directory"),
            }
        });
    }

    if metadata.permissions().readonly() {
        return Err(ValidationError::OutputPathNotWritable {
            path: configured.to_owned(),
            reason: format!("{dir} is read-only"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct TempOutput {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn temp_output() -> TempOutput {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
        TempOutput { _temp: temp, path }
    }

    fn distribution() -> Distribution {
        Distribution {
            module: "example.com/custom".to_owned(),
            otelcol_version: "v1.2.3".to_owned(),
            ..Distribution::default()
        }
    }

    #[test]
    fn accepts_defaults() {
        assert_eq!(validate(&distribution()), Ok(()));
    }

    #[rstest]
    #[case::empty("", "name")]
    #[case::blank("   ", "name")]
    #[case::slash("bin/otelcol", "name")]
    #[case::backslash("bin\\otelcol", "name")]
    #[case::parent("..", "name")]
    fn rejects_bad_names(#[case] name: &str, #[case] field: &str) {
        let dist = Distribution {
            name: name.to_owned(),
            ..distribution()
        };
        let err = validate(&dist).expect_err("name must be rejected");
        assert_eq!(err.field(), field);
    }

    #[test]
    fn rejects_empty_module() {
        let dist = Distribution {
            module: String::new(),
            ..distribution()
        };
        assert_eq!(validate(&dist), Err(ValidationError::EmptyModule));
    }

    #[test]
    fn rejects_empty_base_version() {
        let dist = Distribution {
            otelcol_version: " ".to_owned(),
            ..distribution()
        };
        assert_eq!(validate(&dist), Err(ValidationError::EmptyOtelColVersion));
    }

    #[test]
    fn rejects_empty_distribution_version() {
        let dist = Distribution {
            version: String::new(),
            ..distribution()
        };
        assert_eq!(validate(&dist), Err(ValidationError::EmptyVersion));
    }

    #[test]
    fn checks_short_circuit_in_order() {
        let dist = Distribution {
            name: String::new(),
            module: String::new(),
            otelcol_version: String::new(),
            ..distribution()
        };
        assert_eq!(validate(&dist), Err(ValidationError::EmptyName));
    }

    #[rstest]
    fn accepts_existing_directory(temp_output: TempOutput) {
        let dist = Distribution {
            output_path: Some(temp_output.path.clone()),
            ..distribution()
        };
        assert_eq!(validate(&dist), Ok(()));
    }

    #[rstest]
    fn accepts_creatable_directory_without_creating_it(temp_output: TempOutput) {
        let target = temp_output.path.join("nested").join("dist");
        let dist = Distribution {
            output_path: Some(target.clone()),
            ..distribution()
        };
        assert_eq!(validate(&dist), Ok(()));
        assert!(!target.exists(), "validation must not create directories");
    }

    #[rstest]
    fn rejects_file_as_output(temp_output: TempOutput) {
        let file = temp_output.path.join("occupied");
        std::fs::write(&file, b"x").expect("write file");
        let dist = Distribution {
            output_path: Some(file.clone()),
            ..distribution()
        };
        assert_eq!(
            validate(&dist),
            Err(ValidationError::OutputPathNotDirectory { path: file })
        );
    }

    #[rstest]
    fn rejects_path_below_a_file(temp_output: TempOutput) {
        let file = temp_output.path.join("occupied");
        std::fs::write(&file, b"x").expect("write file");
        let dist = Distribution {
            output_path: Some(file.join("dist")),
            ..distribution()
        };
        let err = validate(&dist).expect_err("path below a file must fail");
        assert!(matches!(err, ValidationError::OutputPathNotWritable { .. }));
        assert_eq!(err.field(), "output_path");
    }
}
