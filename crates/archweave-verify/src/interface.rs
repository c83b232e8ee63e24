//! Interface verification: records against data types.

use std::path::{Path, PathBuf};

use archweave_core::{ArchitectureModel, FieldKind};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, VerifyError};
use crate::modelica::{scan, Restriction};
use crate::report::{ModelLocation, Outcome, Violation, ViolationKind};

/// A record declaration read from an interface artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceArtifact {
    pub name: String,
    pub fields: Vec<ArtifactField>,
    /// File the record was read from.
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactField {
    pub name: String,
    pub type_name: String,
    /// `None` when the declared type is not a builtin scalar.
    pub kind: Option<FieldKind>,
}

impl InterfaceArtifact {
    /// Every record declared in a Modelica source.
    pub fn from_modelica(origin: &str, source: &str) -> Vec<Self> {
        scan(source)
            .into_iter()
            .filter(|class| class.restriction == Restriction::Record)
            .map(|class| Self {
                name: class.name,
                fields: class
                    .components
                    .into_iter()
                    .map(|c| ArtifactField {
                        kind: c.field_kind(),
                        name: c.name,
                        type_name: c.type_name,
                    })
                    .collect(),
                origin: origin.to_string(),
            })
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&ArtifactField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Read every record from the `.mo` files below `dir`.
pub fn load_interfaces(dir: &Path) -> Result<Vec<InterfaceArtifact>> {
    let mut artifacts = Vec::new();
    for path in modelica_files(dir)? {
        let text = read(&path)?;
        artifacts.extend(InterfaceArtifact::from_modelica(&path.display().to_string(), &text));
    }
    debug!(dir = %dir.display(), records = artifacts.len(), "loaded interface artifacts");
    Ok(artifacts)
}

pub(crate) fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.mo` file below `dir`, in file name order.
pub(crate) fn modelica_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VerifyError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            VerifyError::Io {
                path,
                source: err.into(),
            }
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "mo") {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Checks that every data type has a record with the same fields.
pub struct InterfaceVerifier;

impl InterfaceVerifier {
    /// Compare each data type with the artifact named after its interface.
    ///
    /// Fields are compared by name and kind, including array length. Field
    /// order is not significant.
    pub fn verify(model: &ArchitectureModel, artifacts: &[InterfaceArtifact]) -> Outcome {
        let mut violations = Vec::new();
        for (id, dt) in model.data_types() {
            let name = model.interface_name(id);
            let qualified = model.qualified_name(dt.package, &dt.name);
            let Some(artifact) = artifacts.iter().find(|a| a.name == name) else {
                violations.push(Violation::new(
                    ViolationKind::MissingInterface,
                    format!("no interface record `{name}` for data type `{qualified}`"),
                    ModelLocation::new(&qualified, Some(dt.location.clone())),
                ));
                continue;
            };

            for field in &dt.fields {
                let location =
                    ModelLocation::new(format!("{qualified}.{}", field.name), Some(field.location.clone()));
                match artifact.field(&field.name) {
                    None => violations.push(Violation::new(
                        ViolationKind::FieldMismatch,
                        format!(
                            "field `{}` of `{qualified}` is missing from {}",
                            field.name, artifact.origin
                        ),
                        location,
                    )),
                    Some(declared) if declared.kind != Some(field.kind) => {
                        violations.push(Violation::new(
                            ViolationKind::FieldMismatch,
                            format!(
                                "field `{}` of `{qualified}` is {} but {} declares {}",
                                field.name,
                                field.kind,
                                artifact.origin,
                                declared_kind(declared)
                            ),
                            location,
                        ))
                    }
                    Some(_) => {}
                }
            }

            for declared in &artifact.fields {
                if dt.field(&declared.name).is_none() {
                    violations.push(Violation::new(
                        ViolationKind::FieldMismatch,
                        format!(
                            "field `{}` in {} is not declared by `{qualified}`",
                            declared.name, artifact.origin
                        ),
                        ModelLocation::new(
                            format!("{qualified}.{}", declared.name),
                            Some(dt.location.clone()),
                        ),
                    ));
                }
            }
        }
        debug!(violations = violations.len(), "interface check complete");
        Outcome::from_violations(violations)
    }
}

fn declared_kind(field: &ArtifactField) -> String {
    match field.kind {
        Some(kind) => kind.to_string(),
        None => field.type_name.clone(),
    }
}
