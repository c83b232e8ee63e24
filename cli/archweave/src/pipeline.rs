//! Source loading, parsing, and resolution shared by every command.

use std::path::Path;

use anyhow::{Context, Result};
use archweave_core::{ArchitectureModel, CompileError};
use tracing::{debug, info};

use crate::manifest::ArchweaveManifest;

/// A model together with every compile error found while building it.
///
/// When `errors` is non-empty the model is partial: files with a syntax error
/// are missing from it, only the first of duplicate declarations is kept, and
/// unresolved references are left unbound.
pub struct Compiled {
    pub model: ArchitectureModel,
    pub errors: Vec<CompileError>,
    /// Number of source files read.
    pub files: usize,
}

impl Compiled {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse and resolve every architecture source of a project.
///
/// Only a missing or unreadable source directory is an error here; problems
/// in the sources themselves are collected in [`Compiled::errors`].
pub fn compile(project_dir: &Path, manifest: &ArchweaveManifest) -> Result<Compiled> {
    let dir = manifest.sources_dir(project_dir);
    let sources = archweave_syntax::load_sources(&dir, &manifest.architecture.extension)
        .with_context(|| format!("loading architecture sources from {}", dir.display()))?;

    let mut trees = Vec::with_capacity(sources.len());
    let mut errors = Vec::new();
    for parsed in archweave_syntax::parse_sources(&sources) {
        trees.extend(parsed.tree);
        errors.extend(parsed.errors);
    }
    debug!(parsed = trees.len(), failed = sources.len() - trees.len(), "parsed sources");

    let resolution = archweave_resolve::resolve(&trees);
    errors.extend(resolution.errors);
    errors.sort_by(|a, b| a.location().cmp(b.location()));

    info!(files = sources.len(), errors = errors.len(), "compiled architecture");
    Ok(Compiled {
        model: resolution.model,
        errors,
        files: sources.len(),
    })
}

/// Print compile errors to stderr, one per line.
pub fn report_errors(errors: &[CompileError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
}
