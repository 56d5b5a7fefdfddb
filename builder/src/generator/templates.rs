//! Go source templates.
//!
//! Each function is a pure rendering of the distribution and manifest. The
//! output depends only on its inputs, never on the environment.

use super::alias::AliasedComponent;
use crate::distribution::{ComponentKind, Distribution};
use crate::manifest::DependencyManifest;

/// First line of every generated file; matches Go's generated-code convention.
pub const GENERATED_HEADER: &str = "// Code generated by otelcol-builder. DO NOT EDIT.";

/// `go` directive written to the generated `go.mod`.
pub const GO_DIRECTIVE: &str = "1.21";

const COMPONENT_PACKAGE: &str = "go.opentelemetry.io/collector/component";
const SERVICE_PACKAGE: &str = "go.opentelemetry.io/collector/service";
const DEFAULT_COMPONENTS_PACKAGE: &str = "go.opentelemetry.io/collector/service/defaultcomponents";

/// Render `main.go`: imports every component and runs the collector.
pub fn render_main(distribution: &Distribution, components: &[AliasedComponent<'_>]) -> String {
    let imports: String = components
        .iter()
        .map(|c| format!("\t{} {}\n", c.alias, go_quote(&c.entry.package)))
        .collect();
    let imports = if imports.is_empty() {
        imports
    } else {
        format!("\n{imports}")
    };

    let slots: String = ComponentKind::ALL
        .iter()
        .map(|&kind| render_slot(kind, components))
        .collect();

    format!(
        r#"{GENERATED_HEADER}

// Program {name} is a custom OpenTelemetry Collector distribution.
package main

import (
	"log"

	"{COMPONENT_PACKAGE}"
	"{SERVICE_PACKAGE}"
{imports})

func main() {{
	factories, err := components(registry{{
{slots}	}})
	if err != nil {{
		log.Fatalf("failed to build components: %v", err)
	}}

	info := component.BuildInfo{{
		Command:     {command},
		Description: {description},
		Version:     {version},
	}}

	app, err := service.New(service.AppSettings{{BuildInfo: info, Factories: factories}})
	if err != nil {{
		log.Fatalf("failed to construct the application: %v", err)
	}}

	if err := app.Run(); err != nil {{
		log.Fatalf("application run finished with error: %v", err)
	}}
}}
"#,
        name = distribution.name,
        command = go_quote(&distribution.name),
        description = go_quote(&distribution.description),
        version = go_quote(&distribution.version),
    )
}

fn render_slot(kind: ComponentKind, components: &[AliasedComponent<'_>]) -> String {
    let factories: String = components
        .iter()
        .filter(|c| c.entry.kind == Some(kind))
        .map(|c| format!("\t\t\t{}.NewFactory(),\n", c.alias))
        .collect();

    if factories.is_empty() {
        format!("\t\t{}: []component.{}{{}},\n", kind.slot(), kind.factory_type())
    } else {
        format!(
            "\t\t{}: []component.{}{{\n{factories}\t\t}},\n",
            kind.slot(),
            kind.factory_type()
        )
    }
}

/// Render `go.mod`: module, `go` directive, requirements and replacements.
pub fn render_go_mod(manifest: &DependencyManifest) -> String {
    let requires: String = manifest
        .entries
        .iter()
        .map(|entry| format!("\t{} {}\n", entry.import_path, entry.version))
        .collect();

    let replaces: String = manifest
        .replacements
        .iter()
        .map(|r| format!("replace {} => {}\n", r.import_path, go_mod_path(r.path.as_str())))
        .collect();
    let replaces = if replaces.is_empty() {
        replaces
    } else {
        format!("\n{replaces}")
    };

    format!(
        "{GENERATED_HEADER}\n\nmodule {module}\n\ngo {GO_DIRECTIVE}\n\nrequire (\n{requires})\n{replaces}",
        module = manifest.module,
    )
}

/// Render `components.go`: the registry type, the slot bindings and the
/// merge with the base collector's default components.
pub fn render_components(
    distribution: &Distribution,
    components: &[AliasedComponent<'_>],
) -> String {
    let core_import = if distribution.include_core {
        format!("\t\"{DEFAULT_COMPONENTS_PACKAGE}\"\n")
    } else {
        String::new()
    };

    let fields: String = ComponentKind::ALL
        .iter()
        .map(|kind| format!("\t{:<10} []component.{}\n", kind.slot(), kind.factory_type()))
        .collect();

    let bindings: String = ComponentKind::ALL
        .iter()
        .map(|&kind| render_binding(kind, components))
        .collect();

    let core_merge: String = if distribution.include_core {
        let appends: String = ComponentKind::ALL
            .iter()
            .map(|kind| {
                format!(
                    "\tfor _, f := range core.{field} {{\n\t\tr.{slot} = append(r.{slot}, f)\n\t}}\n",
                    field = go_field(*kind),
                    slot = kind.slot(),
                )
            })
            .collect();
        format!(
            "\tcore, err := defaultcomponents.Components()\n\tif err != nil {{\n\t\treturn component.Factories{{}}, err\n\t}}\n{appends}\n"
        )
    } else {
        String::new()
    };

    let maps: String = ComponentKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "\tfactories.{field}, err = component.Make{factory}Map(r.{slot}...)\n\tif err != nil {{\n\t\treturn component.Factories{{}}, err\n\t}}\n\n",
                field = go_field(*kind),
                factory = kind.factory_type(),
                slot = kind.slot(),
            )
        })
        .collect();

    format!(
        r#"{GENERATED_HEADER}

package main

import (
	"{COMPONENT_PACKAGE}"
{core_import})

// registry holds one typed factory slot per component kind.
type registry struct {{
{fields}}}

// registeredModules binds each registered import path to its factory slot.
var registeredModules = map[string][]string{{
{bindings}}}

func components(r registry) (component.Factories, error) {{
	var err error
	factories := component.Factories{{}}

{core_merge}{maps}	return factories, nil
}}
"#
    )
}

fn render_binding(kind: ComponentKind, components: &[AliasedComponent<'_>]) -> String {
    let paths: String = components
        .iter()
        .filter(|c| c.entry.kind == Some(kind))
        .map(|c| format!("\t\t{},\n", go_quote(&c.entry.import_path)))
        .collect();

    if paths.is_empty() {
        format!("\t{}: {{}},\n", go_quote(kind.slot()))
    } else {
        format!("\t{}: {{\n{paths}\t}},\n", go_quote(kind.slot()))
    }
}

/// Field of `component.Factories` holding factories of `kind`.
const fn go_field(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Extension => "Extensions",
        ComponentKind::Receiver => "Receivers",
        ComponentKind::Processor => "Processors",
        ComponentKind::Exporter => "Exporters",
    }
}

/// Quote `value` as a Go interpreted string literal.
pub fn go_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                quoted.push_str(&format!("\\u{:04x}", u32::from(c)));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// `go.mod` paths only need quoting when they contain spaces or quotes.
fn go_mod_path(path: &str) -> String {
    if path.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\') {
        go_quote(path)
    } else {
        path.to_owned()
    }
}
