//! Discovery, loading, and parallel parsing of architecture sources.
//!
//! Sources are plain text files with a configurable extension (`.sysml` by
//! default) found anywhere below the architecture directory of a project.
//! Files are parsed independently, so the whole set is parsed with rayon.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LoadError, Result};
use crate::parser::{parse_file, Parsed};

/// The text of one source file, tagged with the name used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a source file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Find every file below `dir` whose name ends in `.{extension}`.
///
/// Subdirectories are searched recursively. Entries are visited in file name
/// order so that diagnostics and merge order do not depend on directory
/// iteration order.
pub fn discover_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LoadError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            LoadError::Io {
                path,
                source: err.into(),
            }
        })?;
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&suffix))
        {
            found.push(entry.into_path());
        }
    }
    debug!(dir = %dir.display(), count = found.len(), "discovered architecture sources");
    Ok(found)
}

/// Load every discovered source below `dir`.
pub fn load_sources(dir: &Path, extension: &str) -> Result<Vec<SourceFile>> {
    discover_sources(dir, extension)?
        .iter()
        .map(|path| SourceFile::load(path))
        .collect()
}

/// Parse every source in parallel.
///
/// The result has one entry per source, in the same order as `sources`.
pub fn parse_sources(sources: &[SourceFile]) -> Vec<Parsed> {
    sources
        .par_iter()
        .map(|source| {
            let parsed = parse_file(&source.name, &source.text);
            if parsed.tree.is_none() {
                debug!(file = %source.name, errors = parsed.errors.len(), "source failed to parse");
            }
            parsed
        })
        .collect()
}
