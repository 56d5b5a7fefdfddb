//! Builder configuration: the distribution plus the requested components.
//!
//! A [`BuilderConfig`] is read from an optional TOML file and then overlaid
//! with command-line values. The file looks like:
//!
//! ```toml
//! [distribution]
//! name = "otelcol-edge"
//! module = "example.com/edge"
//! otelcol_version = "v0.29.0"
//!
//! [[receivers]]
//! import_path = "example.com/receiver-x"
//! version = "v1.0.0"
//!
//! [[modules]]
//! import_path = "example.com/shared"
//! version = "v0.3.0"
//! path = "../shared"
//! ```

use crate::distribution::{ComponentEntry, ComponentKind, Distribution};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// File name of the default configuration file in the home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".otelcol-builder.toml";

/// The configuration file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid builder configuration.
    #[error("failed to parse configuration file {path}")]
    Parse {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything one pipeline run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// The distribution to build.
    pub distribution: Distribution,
    /// Extension components.
    pub extensions: Vec<ComponentEntry>,
    /// Receiver components.
    pub receivers: Vec<ComponentEntry>,
    /// Processor components.
    pub processors: Vec<ComponentEntry>,
    /// Exporter components.
    pub exporters: Vec<ComponentEntry>,
    /// Plain module requirements, neither imported nor registered.
    pub modules: Vec<ComponentEntry>,
}

impl BuilderConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`toml::de::Error`] when the text is not valid configuration.
    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        debug!("loading configuration from {path}");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// As for [`BuilderConfig::load`], for a file that exists.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("no configuration file at {path}; using defaults");
            Ok(Self::default())
        }
    }

    /// Every requested component with its kind set, in declaration order:
    /// extensions, receivers, processors, exporters, then plain modules.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentEntry> {
        let kinded = ComponentKind::ALL.iter().flat_map(|&kind| {
            self.entries_of(kind)
                .iter()
                .cloned()
                .map(move |entry| entry.with_kind(kind))
        });
        kinded.chain(self.modules.iter().cloned()).collect()
    }

    fn entries_of(&self, kind: ComponentKind) -> &[ComponentEntry] {
        match kind {
            ComponentKind::Extension => &self.extensions,
            ComponentKind::Receiver => &self.receivers,
            ComponentKind::Processor => &self.processors,
            ComponentKind::Exporter => &self.exporters,
        }
    }

    /// Overlay explicitly supplied values onto the distribution.
    pub fn apply(&mut self, overrides: &DistributionOverrides) {
        let dist = &mut self.distribution;
        if let Some(name) = &overrides.name {
            dist.name.clone_from(name);
        }
        if let Some(description) = &overrides.description {
            dist.description.clone_from(description);
        }
        if let Some(version) = &overrides.version {
            dist.version.clone_from(version);
        }
        if let Some(module) = &overrides.module {
            dist.module.clone_from(module);
        }
        if let Some(otelcol_version) = &overrides.otelcol_version {
            dist.otelcol_version.clone_from(otelcol_version);
        }
        if let Some(include_core) = overrides.include_core {
            dist.include_core = include_core;
        }
        if overrides.output_path.is_some() {
            dist.output_path.clone_from(&overrides.output_path);
        }
        if overrides.go.is_some() {
            dist.go.clone_from(&overrides.go);
        }
        if overrides.skip_compilation {
            dist.skip_compilation = true;
        }
    }
}

/// Distribution values supplied on the command line. `None` keeps the value
/// from the file or the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionOverrides {
    /// Executable name.
    pub name: Option<String>,
    /// Long name.
    pub description: Option<String>,
    /// Distribution version.
    pub version: Option<String>,
    /// Go module path.
    pub module: Option<String>,
    /// Base collector version.
    pub otelcol_version: Option<String>,
    /// Whether to register the default components.
    pub include_core: Option<bool>,
    /// Output directory.
    pub output_path: Option<Utf8PathBuf>,
    /// Go binary.
    pub go: Option<Utf8PathBuf>,
    /// Generate only. Can only be switched on.
    pub skip_compilation: bool,
}

/// Platform directory lookup.
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.home_dir().to_path_buf()).ok())
    }
}

/// `$HOME/.otelcol-builder.toml`, when a home directory is known.
#[must_use]
pub fn default_config_path(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
