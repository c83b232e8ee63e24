//! `archweave.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use archweave_gen::{CompositionOptions, InterfaceOptions, DEFAULT_INTERFACE_PACKAGE};
use archweave_verify::Check;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "archweave.toml";

/// The top-level manifest structure for an archweave project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchweaveManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub composition: CompositionConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Where the architecture sources live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Source directory, relative to the project root.
    #[serde(default = "default_sources")]
    pub sources: PathBuf,
    /// Extension of source files.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            extension: default_extension(),
        }
    }
}

fn default_sources() -> PathBuf {
    PathBuf::from("architecture")
}

fn default_extension() -> String {
    "sysml".to_string()
}

/// Artifact generation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_interface_package")]
    pub interface_package: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            interface_package: default_interface_package(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("generated")
}

fn default_interface_package() -> String {
    DEFAULT_INTERFACE_PACKAGE.to_string()
}

/// System structure generation section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionConfig {
    #[serde(default)]
    pub resource_dir: Option<String>,
    /// Prefix of generated FMU names.
    #[serde(default)]
    pub model_package: Option<String>,
    /// Name of the root system; the project name when unset.
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub stop_time: Option<f64>,
}

/// Verification section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Interface records to verify; the generated interfaces when unset.
    #[serde(default)]
    pub interfaces: Option<PathBuf>,
    /// Hand-written component models.
    #[serde(default)]
    pub models: Option<PathBuf>,
    /// Checks to run; all of them when empty.
    #[serde(default)]
    pub checks: Vec<String>,
}

impl ArchweaveManifest {
    /// Search upward from `start_dir` for an `archweave.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: ArchweaveManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing archweave.toml")
    }

    /// Defaults for a directory without a manifest, named after the directory.
    pub fn implicit(project_dir: &Path) -> Self {
        let name = project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("architecture")
            .to_string();
        Self {
            project: ProjectConfig {
                name,
                version: default_version(),
                description: None,
            },
            architecture: ArchitectureConfig::default(),
            generate: GenerateConfig::default(),
            composition: CompositionConfig::default(),
            verify: VerifyConfig::default(),
        }
    }

    pub fn sources_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.architecture.sources)
    }

    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.generate.output)
    }

    /// Directory of the interface records checked by `verify`.
    pub fn interfaces_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.verify.interfaces {
            Some(dir) => project_dir.join(dir),
            None => archweave_gen::resolve_paths(&self.output_dir(project_dir)).0,
        }
    }

    pub fn models_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.verify.models.as_deref().unwrap_or(Path::new("models")))
    }

    pub fn interface_options(&self) -> InterfaceOptions {
        InterfaceOptions {
            package: self.generate.interface_package.clone(),
        }
    }

    pub fn composition_options(&self) -> CompositionOptions {
        let defaults = CompositionOptions::default();
        let c = &self.composition;
        CompositionOptions {
            resource_dir: c.resource_dir.clone().unwrap_or(defaults.resource_dir),
            model_package: c.model_package.clone(),
            system_name: c
                .system_name
                .clone()
                .unwrap_or_else(|| self.project.name.clone()),
            start_time: c.start_time.unwrap_or(defaults.start_time),
            stop_time: c.stop_time.unwrap_or(defaults.stop_time),
        }
    }

    /// The checks selected in `[verify]`.
    pub fn checks(&self) -> Result<Vec<Check>> {
        if self.verify.checks.is_empty() {
            return Ok(Check::ALL.to_vec());
        }
        self.verify
            .checks
            .iter()
            .map(|name| {
                Check::from_name(name).with_context(|| {
                    format!("unknown check '{name}' (expected interface, connection, or variable)")
                })
            })
            .collect()
    }

    /// Generate the default template for `archweave init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[architecture]
sources = "architecture"
extension = "sysml"

[generate]
output = "generated"
interface_package = "{DEFAULT_INTERFACE_PACKAGE}"

[composition]
resource_dir = "resources"
start_time = 0.0
stop_time = 3600.0

[verify]
models = "models"
"#
        )
    }
}
