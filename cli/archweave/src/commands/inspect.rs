//! `archweave inspect` — model summary as text or JSON.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Result};
use archweave_core::{ArchitectureModel, FieldDefault};
use serde_json::json;

use crate::manifest::ArchweaveManifest;
use crate::pipeline::{compile, report_errors};

/// Print the resolved model. A partial model is still shown when the
/// sources have compile errors, but the command then fails.
pub fn run(project_dir: &Path, manifest: &ArchweaveManifest, export: Option<&str>) -> Result<()> {
    let compiled = compile(project_dir, manifest)?;
    match export {
        None | Some("text") => print!("{}", render_text(&compiled.model)),
        Some("json") => {
            let data = json!({
                "project": manifest.project.name,
                "files": compiled.files,
                "compile_errors": compiled.errors,
                "model": compiled.model,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Some(other) => bail!("unknown export format '{other}' (expected text or json)"),
    }

    if !compiled.is_clean() {
        report_errors(&compiled.errors);
        bail!("{} compile error(s)", compiled.errors.len());
    }
    Ok(())
}

pub(crate) fn render_text(model: &ArchitectureModel) -> String {
    let mut text = String::new();
    text.push_str("=== Architecture Model ===\n");
    let _ = writeln!(
        text,
        "Packages: {} | Data types: {} | Part definitions: {} | Part usages: {} | Connections: {} | Requirements: {}",
        model.packages().count() - 1,
        model.data_types().count(),
        model.part_defs().count(),
        model.part_usages().count(),
        model.connections().count(),
        model.requirements().count(),
    );

    let data_types: Vec<_> = model.data_types().collect();
    if !data_types.is_empty() {
        text.push_str("\n--- Data types ---\n");
    }
    for (id, dt) in data_types {
        let _ = writeln!(
            text,
            "{} (interface {})",
            model.qualified_name(dt.package, &dt.name),
            model.interface_name(id)
        );
        for field in &dt.fields {
            let _ = writeln!(text, "  {} : {}{}", field.name, field.kind, default_suffix(&field.default));
        }
    }

    let part_defs: Vec<_> = model.part_defs().collect();
    if !part_defs.is_empty() {
        text.push_str("\n--- Part definitions ---\n");
    }
    for (_, def) in part_defs {
        let _ = writeln!(text, "{}", model.qualified_name(def.package, &def.name));
        for port in &def.ports {
            let _ = writeln!(text, "  {} {} : {}", port.direction, port.name, port.port_type.name);
        }
        for attribute in &def.attributes {
            let _ = writeln!(
                text,
                "  attribute {} : {}{}",
                attribute.name,
                attribute.kind,
                default_suffix(&attribute.default)
            );
        }
    }

    for (_, composition) in model.non_empty_compositions() {
        let _ = writeln!(text, "\n--- Composition {} ---", composition.name);
        for (name, &usage) in &composition.usages {
            let _ = writeln!(text, "  part {name} : {}", model.part_usage(usage).definition.name);
        }
        for &conn in &composition.connections {
            let conn = model.connection(conn);
            let _ = writeln!(text, "  connect {} to {}", conn.from, conn.to);
        }
    }

    let requirements: Vec<_> = model.requirements().collect();
    if !requirements.is_empty() {
        text.push_str("\n--- Requirements ---\n");
    }
    for (_, req) in requirements {
        let _ = write!(text, "{}", req.identifier);
        if !req.metrics.is_empty() {
            let _ = write!(text, " [{}]", req.metrics.join(", "));
        }
        text.push('\n');
        if !req.text.is_empty() {
            let _ = writeln!(text, "  {}", req.text);
        }
    }
    text
}

fn default_suffix(default: &Option<FieldDefault>) -> String {
    match default {
        None => String::new(),
        Some(FieldDefault::Scalar(value)) => format!(" = {value}"),
        Some(FieldDefault::PerIndex(values)) => {
            let values: Vec<_> = values.iter().map(|v| v.to_string()).collect();
            format!(" = [{}]", values.join(", "))
        }
    }
}
