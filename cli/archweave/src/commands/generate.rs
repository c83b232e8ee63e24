//! `archweave generate` — interface records, system structure files, and
//! terminal definitions.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use archweave_gen::{generate_compositions, generate_interfaces, generate_terminals, resolve_paths};
use tracing::info;

use crate::manifest::ArchweaveManifest;
use crate::pipeline::{compile, report_errors};

/// Compile the architecture and write every artifact below the output
/// directory (`out` overrides the manifest).
pub fn run(project_dir: &Path, manifest: &ArchweaveManifest, out: Option<&Path>) -> Result<()> {
    let written = generate(project_dir, manifest, out)?;
    println!("Generated {} file(s)", written.len());
    for path in &written {
        let shown = path.strip_prefix(project_dir).unwrap_or(path);
        println!("  {}", shown.display());
    }
    Ok(())
}

/// Returns the paths written. Nothing is written when the sources have any
/// compile error.
pub(crate) fn generate(
    project_dir: &Path,
    manifest: &ArchweaveManifest,
    out: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let compiled = compile(project_dir, manifest)?;
    if !compiled.is_clean() {
        report_errors(&compiled.errors);
        bail!(
            "{} compile error(s); no artifacts generated",
            compiled.errors.len()
        );
    }
    let model = &compiled.model;

    let interface_options = manifest.interface_options();
    let composition_options = manifest.composition_options();
    let ((interfaces, compositions), terminals) = rayon::join(
        || {
            rayon::join(
                || generate_interfaces(model, &interface_options),
                || generate_compositions(model, &composition_options),
            )
        },
        || generate_terminals(model),
    );

    let output = match out {
        Some(dir) => project_dir.join(dir),
        None => manifest.output_dir(project_dir),
    };
    let (interface_dir, composition_dir) = resolve_paths(&output);

    let mut written = archweave_gen::write_interfaces(&interface_dir, &interface_options, &interfaces)
        .context("writing interface records")?;
    for document in &compositions {
        written.extend(
            archweave_gen::write_composition(&composition_dir, document)
                .with_context(|| format!("writing system structure '{}'", document.name))?,
        );
    }
    written.push(archweave_gen::write_terminals(&output, &terminals).context("writing terminals")?);

    info!(
        interfaces = interfaces.len(),
        compositions = compositions.len(),
        terminals = terminals.terminals.len(),
        output = %output.display(),
        "generation complete"
    );
    Ok(written)
}
