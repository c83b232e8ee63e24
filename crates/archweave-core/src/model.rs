//! The resolved architecture model.
//!
//! All declarations are stored in flat arenas inside [`ArchitectureModel`] and
//! addressed by `u32` newtype ids. Packages own per-kind name tables that map
//! simple names to ids; compositions (the body of a package or of a part
//! definition) own the part usages and connections declared inside them.
//!
//! The model is only mutated through [`crate::builder::ModelBuilder`]; every
//! consumer after resolution sees it read-only.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::kind::Field;
use crate::location::SourceLocation;
use crate::port::Port;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifies a package. The root package is always id 0.
    PackageId
);
arena_id!(DataTypeId);
arena_id!(PartDefId);
arena_id!(PartUsageId);
arena_id!(ConnectionId);
arena_id!(RequirementId);
arena_id!(
    /// Identifies the body of a package or part definition.
    CompositionId
);

/// A named scope. Packages declared with the same path in several files are
/// merged into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Simple name; empty for the root package.
    pub name: String,
    /// Full path from the root, excluding the root itself.
    pub path: Vec<String>,
    pub parent: Option<PackageId>,
    pub children: IndexMap<String, PackageId>,
    pub data_types: IndexMap<String, DataTypeId>,
    pub part_defs: IndexMap<String, PartDefId>,
    pub requirements: IndexMap<String, RequirementId>,
    /// Imported package paths, in declaration order.
    pub imports: Vec<Vec<String>>,
    pub composition: CompositionId,
    /// Every declaration site that contributed to this package.
    pub locations: Vec<SourceLocation>,
}

impl Package {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn qualified_name(&self) -> String {
        self.path.join("::")
    }
}

/// A named record type used as the payload of ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTypeDefinition {
    pub name: String,
    pub package: PackageId,
    pub fields: Vec<Field>,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

impl DataTypeDefinition {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A component blueprint: ports, attributes, and an optional internal
/// composition of nested part usages and connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDefinition {
    pub name: String,
    pub package: PackageId,
    pub ports: Vec<Port>,
    pub attributes: Vec<Field>,
    pub composition: CompositionId,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

impl PartDefinition {
    /// Look up a port by name, returning its index and declaration.
    pub fn port(&self, name: &str) -> Option<(usize, &Port)> {
        self.ports.iter().enumerate().find(|(_, p)| p.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Field> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A reference to a part definition by name, bound once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRef {
    pub name: String,
    pub target: Option<PartDefId>,
}

/// A named instance of a part definition within a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUsage {
    pub name: String,
    pub composition: CompositionId,
    pub definition: PartRef,
    pub location: SourceLocation,
}

/// The port an endpoint resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointTarget {
    pub usage: PartUsageId,
    pub part: PartDefId,
    /// Index into the part definition's `ports`.
    pub port: usize,
}

/// One side of a connection, written `usage.port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub usage: String,
    pub port: String,
    pub target: Option<EndpointTarget>,
}

impl Endpoint {
    pub fn new(usage: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            port: port.into(),
            target: None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.usage, self.port)
    }
}

/// Which side of a connection an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    From,
    To,
}

/// A directed link `connect from to to` between two part usage ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub composition: CompositionId,
    pub from: Endpoint,
    pub to: Endpoint,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositionOwner {
    Package(PackageId),
    Part(PartDefId),
}

/// The part usages and connections declared in one package or part body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Qualified name of the owner; `<root>` for the root package.
    pub name: String,
    pub owner: CompositionOwner,
    pub usages: IndexMap<String, PartUsageId>,
    pub connections: Vec<ConnectionId>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

/// A textual requirement with optional metric names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub identifier: String,
    pub package: PackageId,
    pub text: String,
    pub metrics: Vec<String>,
    pub location: SourceLocation,
}

/// The complete, merged architecture description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureModel {
    pub(crate) packages: Vec<Package>,
    pub(crate) data_types: Vec<DataTypeDefinition>,
    pub(crate) part_defs: Vec<PartDefinition>,
    pub(crate) part_usages: Vec<PartUsage>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) compositions: Vec<Composition>,
}

impl ArchitectureModel {
    pub fn root(&self) -> PackageId {
        PackageId(0)
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn data_type(&self, id: DataTypeId) -> &DataTypeDefinition {
        &self.data_types[id.index()]
    }

    pub fn part_def(&self, id: PartDefId) -> &PartDefinition {
        &self.part_defs[id.index()]
    }

    pub fn part_usage(&self, id: PartUsageId) -> &PartUsage {
        &self.part_usages[id.index()]
    }

    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.index()]
    }

    pub fn requirement(&self, id: RequirementId) -> &Requirement {
        &self.requirements[id.index()]
    }

    pub fn composition(&self, id: CompositionId) -> &Composition {
        &self.compositions[id.index()]
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> + '_ {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId::from_index(i), p))
    }

    pub fn data_types(&self) -> impl Iterator<Item = (DataTypeId, &DataTypeDefinition)> + '_ {
        self.data_types
            .iter()
            .enumerate()
            .map(|(i, d)| (DataTypeId::from_index(i), d))
    }

    pub fn part_defs(&self) -> impl Iterator<Item = (PartDefId, &PartDefinition)> + '_ {
        self.part_defs
            .iter()
            .enumerate()
            .map(|(i, d)| (PartDefId::from_index(i), d))
    }

    pub fn part_usages(&self) -> impl Iterator<Item = (PartUsageId, &PartUsage)> + '_ {
        self.part_usages
            .iter()
            .enumerate()
            .map(|(i, u)| (PartUsageId::from_index(i), u))
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> + '_ {
        self.connections
            .iter()
            .enumerate()
            .map(|(i, c)| (ConnectionId::from_index(i), c))
    }

    pub fn requirements(&self) -> impl Iterator<Item = (RequirementId, &Requirement)> + '_ {
        self.requirements
            .iter()
            .enumerate()
            .map(|(i, r)| (RequirementId::from_index(i), r))
    }

    pub fn compositions(&self) -> impl Iterator<Item = (CompositionId, &Composition)> + '_ {
        self.compositions
            .iter()
            .enumerate()
            .map(|(i, c)| (CompositionId::from_index(i), c))
    }

    /// The port an endpoint target points at.
    pub fn port(&self, target: EndpointTarget) -> &Port {
        &self.part_def(target.part).ports[target.port]
    }

    /// Walk `path` down from `start` through child packages.
    pub fn descend(&self, start: PackageId, path: &[&str]) -> Option<PackageId> {
        path.iter().try_fold(start, |current, segment| {
            self.package(current).children.get(*segment).copied()
        })
    }

    /// Find a package by its absolute path.
    pub fn find_package(&self, path: &[&str]) -> Option<PackageId> {
        self.descend(self.root(), path)
    }

    /// Find a data type by `::`-qualified name, or by simple name anywhere.
    pub fn find_data_type(&self, name: &str) -> Option<DataTypeId> {
        let (path, simple) = split_qualified(name);
        if path.is_empty() {
            return self
                .data_types()
                .find(|(_, d)| d.name == simple)
                .map(|(id, _)| id);
        }
        let pkg = self.find_package(&path)?;
        self.package(pkg).data_types.get(simple).copied()
    }

    /// Find a part definition by `::`-qualified name, or by simple name anywhere.
    pub fn find_part_def(&self, name: &str) -> Option<PartDefId> {
        let (path, simple) = split_qualified(name);
        if path.is_empty() {
            return self
                .part_defs()
                .find(|(_, d)| d.name == simple)
                .map(|(id, _)| id);
        }
        let pkg = self.find_package(&path)?;
        self.package(pkg).part_defs.get(simple).copied()
    }

    /// `Pkg::Sub::name` for a declaration inside `package`.
    pub fn qualified_name(&self, package: PackageId, name: &str) -> String {
        let pkg = self.package(package);
        if pkg.is_root() {
            name.to_string()
        } else {
            format!("{}::{}", pkg.qualified_name(), name)
        }
    }

    /// Name of the generated interface for a data type.
    ///
    /// The simple name is used when it is unique across the model; otherwise
    /// the package path and the name are joined with `_`.
    pub fn interface_name(&self, id: DataTypeId) -> String {
        let dt = self.data_type(id);
        let shared = self
            .data_types
            .iter()
            .filter(|other| other.name == dt.name)
            .count()
            > 1;
        if !shared {
            return dt.name.clone();
        }
        let mut segments = self.package(dt.package).path.clone();
        segments.push(dt.name.clone());
        segments.join("_")
    }

    /// Compositions that contain at least one part usage.
    pub fn non_empty_compositions(&self) -> impl Iterator<Item = (CompositionId, &Composition)> {
        self.compositions().filter(|(_, c)| !c.is_empty())
    }
}

fn split_qualified(name: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = name.split("::").collect();
    let simple = segments.pop().unwrap_or(name);
    (segments, simple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::kind::Field;

    fn two_vec3_model() -> ArchitectureModel {
        let mut b = ModelBuilder::new();
        let nav = b.package_path(&["Nav"]);
        let ctl = b.package_path(&["Ctl"]);
        b.add_data_type(nav, "Vec3", vec![Field::real("x")], None, SourceLocation::synthetic())
            .unwrap();
        b.add_data_type(ctl, "Vec3", vec![Field::real("y")], None, SourceLocation::synthetic())
            .unwrap();
        b.add_data_type(ctl, "Gain", vec![Field::real("k")], None, SourceLocation::synthetic())
            .unwrap();
        b.build()
    }

    #[test]
    fn root_package_is_first() {
        let model = ModelBuilder::new().build();
        let root = model.package(model.root());
        assert!(root.is_root());
        assert_eq!(model.composition(root.composition).name, "<root>");
    }

    #[test]
    fn interface_name_prefixes_only_on_collision() {
        let model = two_vec3_model();
        let nav_vec3 = model.find_data_type("Nav::Vec3").unwrap();
        let ctl_vec3 = model.find_data_type("Ctl::Vec3").unwrap();
        let gain = model.find_data_type("Gain").unwrap();
        assert_eq!(model.interface_name(nav_vec3), "Nav_Vec3");
        assert_eq!(model.interface_name(ctl_vec3), "Ctl_Vec3");
        assert_eq!(model.interface_name(gain), "Gain");
    }

    #[test]
    fn find_package_walks_children() {
        let mut b = ModelBuilder::new();
        let inner = b.package_path(&["Outer", "Inner"]);
        let model = b.build();
        assert_eq!(model.find_package(&["Outer", "Inner"]), Some(inner));
        assert_eq!(model.find_package(&["Inner"]), None);
        assert_eq!(model.qualified_name(inner, "T"), "Outer::Inner::T");
    }

    #[test]
    fn model_serializes_to_json() {
        let model = two_vec3_model();
        let json = serde_json::to_string(&model).unwrap();
        let back: ArchitectureModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
