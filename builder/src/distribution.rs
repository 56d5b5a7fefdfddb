//! Distribution model: the target binary and the components it bundles.
//!
//! A [`Distribution`] is built once per invocation by the configuration layer
//! and handed to the pipeline by value. [`ComponentEntry`] values describe the
//! requested Go modules before resolution.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// Default executable name of the generated collector.
pub const DEFAULT_NAME: &str = "otelcol-custom";

/// Default human-readable description of the distribution.
pub const DEFAULT_DESCRIPTION: &str = "Custom OpenTelemetry Collector distribution";

/// Default version stamped into the generated build info.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Default Go module path of the generated program.
pub const DEFAULT_MODULE: &str = "go.opentelemetry.io/collector/cmd/builder";

/// Default base collector version to depend on.
pub const DEFAULT_OTELCOL_VERSION: &str = "v0.29.0";

/// Module path of the base collector every distribution depends on.
pub const BASE_COLLECTOR_MODULE: &str = "go.opentelemetry.io/collector";

/// Description of the custom collector binary to assemble.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Distribution {
    /// Executable name; also the file name of the compiled binary.
    pub name: String,
    /// Long, human-readable name.
    pub description: String,
    /// Version of the distribution itself.
    pub version: String,
    /// Where generated sources and the binary are written. `None` allocates a
    /// fresh temporary directory.
    pub output_path: Option<Utf8PathBuf>,
    /// Whether the base collector's default components are registered.
    pub include_core: bool,
    /// Version of the base collector module.
    pub otelcol_version: String,
    /// Go module path of the generated program.
    pub module: String,
    /// Go binary used for the toolchain phases. `None` uses `go` from `PATH`.
    pub go: Option<Utf8PathBuf>,
    /// Generate sources only; never invoke the toolchain.
    pub skip_compilation: bool,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            output_path: None,
            include_core: true,
            otelcol_version: DEFAULT_OTELCOL_VERSION.to_owned(),
            module: DEFAULT_MODULE.to_owned(),
            go: None,
            skip_compilation: false,
        }
    }
}

impl Distribution {
    /// Path of the compiled executable inside `output_dir`.
    #[must_use]
    pub fn binary_path(&self, output_dir: &Utf8Path) -> Utf8PathBuf {
        output_dir.join(&self.name)
    }

    /// The Go binary the toolchain phases should run.
    #[must_use]
    pub fn go_binary(&self) -> &str {
        self.go.as_ref().map_or("go", |path| path.as_str())
    }
}

/// The kind of pluggable component a module provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Extensions such as health checks.
    Extension,
    /// Receivers ingest telemetry.
    Receiver,
    /// Processors transform telemetry in flight.
    Processor,
    /// Exporters send telemetry onwards.
    Exporter,
}

impl ComponentKind {
    /// Every kind, in the order the registry declares its slots.
    pub const ALL: [Self; 4] = [
        Self::Extension,
        Self::Receiver,
        Self::Processor,
        Self::Exporter,
    ];

    /// Name of the registry slot holding factories of this kind.
    #[must_use]
    pub const fn slot(self) -> &'static str {
        match self {
            Self::Extension => "extensions",
            Self::Receiver => "receivers",
            Self::Processor => "processors",
            Self::Exporter => "exporters",
        }
    }

    /// Go type name of the factory, without the package qualifier.
    #[must_use]
    pub const fn factory_type(self) -> &'static str {
        match self {
            Self::Extension => "ExtensionFactory",
            Self::Receiver => "ReceiverFactory",
            Self::Processor => "ProcessorFactory",
            Self::Exporter => "ExporterFactory",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extension => "extension",
            Self::Receiver => "receiver",
            Self::Processor => "processor",
            Self::Exporter => "exporter",
        };
        f.write_str(name)
    }
}

/// One requested Go module, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    /// Go module path; unique across the whole request.
    pub import_path: String,
    /// Tagged semantic version or pseudo-version.
    #[serde(default)]
    pub version: String,
    /// Local directory replacing the module, for development overrides.
    #[serde(default)]
    pub path: Option<Utf8PathBuf>,
    /// Registry slot; `None` for plain module requirements.
    #[serde(skip)]
    pub kind: Option<ComponentKind>,
    /// Go package providing `NewFactory`, when it is not the module root.
    #[serde(default)]
    pub package: Option<String>,
    /// Import alias used in the generated sources.
    #[serde(default)]
    pub name: Option<String>,
}

impl ComponentEntry {
    /// A plain module requirement at `version`.
    #[must_use]
    pub fn new(import_path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            version: version.into(),
            path: None,
            kind: None,
            package: None,
            name: None,
        }
    }

    /// Register the module's factory in the given slot.
    #[must_use]
    pub const fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Replace the module with a local directory.
    #[must_use]
    pub fn with_replacement(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Import the factory from a sub-package of the module.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Use an explicit import alias.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
