//! Variable verification: component models against part ports.

use std::collections::HashSet;
use std::path::Path;

use archweave_core::{ArchitectureModel, PartDefId, PortDirection};
use tracing::debug;

use crate::error::Result;
use crate::interface::{modelica_files, read};
use crate::modelica::{scan, Restriction};
use crate::report::{ModelLocation, Outcome, Violation, ViolationKind};

/// A hand-written component model and the variables it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub variables: Vec<ModelVariable>,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVariable {
    pub name: String,
    pub type_name: String,
    pub causality: Option<PortDirection>,
}

impl ModelSource {
    /// Every `model` and `block` declared in a Modelica source.
    pub fn from_modelica(origin: &str, source: &str) -> Vec<Self> {
        scan(source)
            .into_iter()
            .filter(|c| matches!(c.restriction, Restriction::Model | Restriction::Block))
            .map(|class| Self {
                name: class.name,
                variables: class
                    .components
                    .into_iter()
                    .map(|c| ModelVariable {
                        name: c.name,
                        type_name: c.type_name,
                        causality: c.causality,
                    })
                    .collect(),
                origin: origin.to_string(),
            })
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<&ModelVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Read every model and block from the `.mo` files below `dir`.
pub fn load_models(dir: &Path) -> Result<Vec<ModelSource>> {
    let mut sources = Vec::new();
    for path in modelica_files(dir)? {
        let text = read(&path)?;
        sources.extend(ModelSource::from_modelica(&path.display().to_string(), &text));
    }
    debug!(dir = %dir.display(), models = sources.len(), "loaded component models");
    Ok(sources)
}

/// Checks that the model of every instantiated part declares an input or
/// output variable for each of its ports, and no interface-typed input or
/// output beyond them.
pub struct VariableVerifier;

impl VariableVerifier {
    /// Each part definition used by at least one part usage is checked once,
    /// against the model source of the same name.
    pub fn verify(model: &ArchitectureModel, sources: &[ModelSource]) -> Outcome {
        let interfaces: HashSet<String> = model
            .data_types()
            .flat_map(|(id, dt)| [model.interface_name(id), dt.name.clone()])
            .collect();

        let mut seen: HashSet<PartDefId> = HashSet::new();
        let mut violations = Vec::new();
        for (_, usage) in model.part_usages() {
            let Some(def_id) = usage.definition.target else {
                continue;
            };
            if !seen.insert(def_id) {
                continue;
            }
            let def = model.part_def(def_id);
            let qualified = model.qualified_name(def.package, &def.name);
            let Some(source) = sources.iter().find(|s| s.name == def.name) else {
                violations.push(Violation::new(
                    ViolationKind::MissingModel,
                    format!("no model `{}` for part definition `{qualified}`", def.name),
                    ModelLocation::new(&qualified, Some(def.location.clone())),
                ));
                continue;
            };

            for port in &def.ports {
                let location = ModelLocation::new(
                    format!("{qualified}.{}", port.name),
                    Some(port.location.clone()),
                );
                let variable = source
                    .variable(&port.name)
                    .filter(|v| v.causality == Some(port.direction));
                let Some(variable) = variable else {
                    violations.push(Violation::new(
                        ViolationKind::MissingVariable,
                        format!(
                            "{} declares no {} variable `{}` for port `{qualified}.{}`",
                            source.origin,
                            port.direction.causality(),
                            port.name,
                            port.name
                        ),
                        location,
                    ));
                    continue;
                };

                let declared = variable.type_name.rsplit('.').next().unwrap_or_default();
                let expected = port
                    .port_type
                    .target
                    .map(|id| model.interface_name(id))
                    .unwrap_or_else(|| port.port_type.simple_name().to_string());
                if interfaces.contains(declared) && declared != expected {
                    violations.push(Violation::new(
                        ViolationKind::VariableTypeMismatch,
                        format!(
                            "variable `{}` in {} is declared as {declared} but port `{qualified}.{}` carries {expected}",
                            variable.name, source.origin, port.name
                        ),
                        location,
                    ));
                }
            }

            // Interface-typed inputs and outputs must each be a port of the part.
            for variable in &source.variables {
                let declared = variable.type_name.rsplit('.').next().unwrap_or_default();
                if variable.causality.is_none()
                    || !interfaces.contains(declared)
                    || def.port(&variable.name).is_some()
                {
                    continue;
                }
                violations.push(Violation::new(
                    ViolationKind::UnexpectedVariable,
                    format!(
                        "interface variable `{}` ({declared}) in {} is not a port of part definition `{qualified}`",
                        variable.name, source.origin
                    ),
                    ModelLocation::new(
                        format!("{qualified}.{}", variable.name),
                        Some(def.location.clone()),
                    ),
                ));
            }
        }
        debug!(violations = violations.len(), "variable check complete");
        Outcome::from_violations(violations)
    }
}
