//! Model construction API.
//!
//! The `ModelBuilder` is the only way to populate an [`ArchitectureModel`].
//! The resolver uses it to merge syntax trees and to bind references; tests
//! and tools use it to construct models programmatically.
//!
//! # Example
//!
//! ```rust
//! use archweave_core::builder::ModelBuilder;
//! use archweave_core::kind::Field;
//! use archweave_core::location::SourceLocation;
//! use archweave_core::port::Port;
//!
//! let mut builder = ModelBuilder::new();
//! let nav = builder.package_path(&["Nav"]);
//! builder
//!     .add_data_type(nav, "Vec3", vec![Field::real("x")], None, SourceLocation::synthetic())
//!     .unwrap();
//! let imu = builder
//!     .add_part_def(nav, "Imu", None, SourceLocation::synthetic())
//!     .unwrap();
//! builder.add_port(imu, Port::output("accel", "Vec3")).unwrap();
//!
//! let model = builder.build();
//! assert_eq!(model.part_defs().count(), 1);
//! ```

use indexmap::IndexMap;

use crate::kind::Field;
use crate::location::SourceLocation;
use crate::model::{
    ArchitectureModel, Composition, CompositionId, CompositionOwner, Connection, ConnectionId,
    DataTypeDefinition, DataTypeId, Endpoint, EndpointSide, EndpointTarget, Package, PackageId,
    PartDefId, PartDefinition, PartRef, PartUsage, PartUsageId, Requirement, RequirementId,
};
use crate::port::Port;

/// Returned when a name is already taken in its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyDeclared {
    /// Where the existing declaration lives.
    pub previous: SourceLocation,
}

/// A builder for architecture models.
///
/// Names are unique per kind within their scope; the first declaration of a
/// name wins and later ones are refused with [`AlreadyDeclared`].
pub struct ModelBuilder {
    model: ArchitectureModel,
}

impl ModelBuilder {
    /// Create a builder holding only the root package.
    pub fn new() -> Self {
        let mut model = ArchitectureModel {
            packages: Vec::new(),
            data_types: Vec::new(),
            part_defs: Vec::new(),
            part_usages: Vec::new(),
            connections: Vec::new(),
            requirements: Vec::new(),
            compositions: Vec::new(),
        };
        let composition = push_composition(
            &mut model,
            "<root>".to_string(),
            CompositionOwner::Package(PackageId(0)),
        );
        model.packages.push(Package {
            name: String::new(),
            path: Vec::new(),
            parent: None,
            children: IndexMap::new(),
            data_types: IndexMap::new(),
            part_defs: IndexMap::new(),
            requirements: IndexMap::new(),
            imports: Vec::new(),
            composition,
            locations: Vec::new(),
        });
        Self { model }
    }

    pub fn root(&self) -> PackageId {
        self.model.root()
    }

    /// Read access to the model under construction.
    pub fn model(&self) -> &ArchitectureModel {
        &self.model
    }

    /// Get or create the child package `name` of `parent`.
    ///
    /// Packages with the same path merge, so reopening a package in another
    /// file only records the extra declaration site.
    pub fn package(
        &mut self,
        parent: PackageId,
        name: &str,
        location: SourceLocation,
    ) -> PackageId {
        if let Some(&existing) = self.model.package(parent).children.get(name) {
            self.model.packages[existing.index()].locations.push(location);
            return existing;
        }

        let id = PackageId::from_index(self.model.packages.len());
        let mut path = self.model.package(parent).path.clone();
        path.push(name.to_string());
        let composition = push_composition(
            &mut self.model,
            path.join("::"),
            CompositionOwner::Package(id),
        );
        self.model.packages.push(Package {
            name: name.to_string(),
            path,
            parent: Some(parent),
            children: IndexMap::new(),
            data_types: IndexMap::new(),
            part_defs: IndexMap::new(),
            requirements: IndexMap::new(),
            imports: Vec::new(),
            composition,
            locations: vec![location],
        });
        self.model.packages[parent.index()]
            .children
            .insert(name.to_string(), id);
        id
    }

    /// Get or create a package by absolute path.
    pub fn package_path(&mut self, path: &[&str]) -> PackageId {
        let mut current = self.root();
        for segment in path {
            current = self.package(current, segment, SourceLocation::synthetic());
        }
        current
    }

    pub fn add_import(&mut self, package: PackageId, path: Vec<String>) {
        let imports = &mut self.model.packages[package.index()].imports;
        if !imports.contains(&path) {
            imports.push(path);
        }
    }

    pub fn add_data_type(
        &mut self,
        package: PackageId,
        name: &str,
        fields: Vec<Field>,
        doc: Option<String>,
        location: SourceLocation,
    ) -> Result<DataTypeId, AlreadyDeclared> {
        if let Some(&existing) = self.model.package(package).data_types.get(name) {
            return Err(AlreadyDeclared {
                previous: self.model.data_type(existing).location.clone(),
            });
        }
        let id = DataTypeId::from_index(self.model.data_types.len());
        self.model.data_types.push(DataTypeDefinition {
            name: name.to_string(),
            package,
            fields,
            doc,
            location,
        });
        self.model.packages[package.index()]
            .data_types
            .insert(name.to_string(), id);
        Ok(id)
    }

    /// Declare a part definition with an empty body.
    pub fn add_part_def(
        &mut self,
        package: PackageId,
        name: &str,
        doc: Option<String>,
        location: SourceLocation,
    ) -> Result<PartDefId, AlreadyDeclared> {
        if let Some(&existing) = self.model.package(package).part_defs.get(name) {
            return Err(AlreadyDeclared {
                previous: self.model.part_def(existing).location.clone(),
            });
        }
        let id = PartDefId::from_index(self.model.part_defs.len());
        let qualified = self.model.qualified_name(package, name);
        let composition =
            push_composition(&mut self.model, qualified, CompositionOwner::Part(id));
        self.model.part_defs.push(PartDefinition {
            name: name.to_string(),
            package,
            ports: Vec::new(),
            attributes: Vec::new(),
            composition,
            doc,
            location,
        });
        self.model.packages[package.index()]
            .part_defs
            .insert(name.to_string(), id);
        Ok(id)
    }

    /// Add a port, returning its index within the part definition.
    pub fn add_port(&mut self, part: PartDefId, port: Port) -> Result<usize, AlreadyDeclared> {
        let def = &mut self.model.part_defs[part.index()];
        if let Some(existing) = def.ports.iter().find(|p| p.name == port.name) {
            return Err(AlreadyDeclared {
                previous: existing.location.clone(),
            });
        }
        def.ports.push(port);
        Ok(def.ports.len() - 1)
    }

    pub fn add_attribute(&mut self, part: PartDefId, field: Field) -> Result<(), AlreadyDeclared> {
        let def = &mut self.model.part_defs[part.index()];
        if let Some(existing) = def.attributes.iter().find(|a| a.name == field.name) {
            return Err(AlreadyDeclared {
                previous: existing.location.clone(),
            });
        }
        def.attributes.push(field);
        Ok(())
    }

    /// Declare `name : definition` inside a composition. The definition name
    /// stays unbound until [`ModelBuilder::bind_usage`] is called.
    pub fn add_part_usage(
        &mut self,
        composition: CompositionId,
        name: &str,
        definition: &str,
        location: SourceLocation,
    ) -> Result<PartUsageId, AlreadyDeclared> {
        if let Some(&existing) = self.model.composition(composition).usages.get(name) {
            return Err(AlreadyDeclared {
                previous: self.model.part_usage(existing).location.clone(),
            });
        }
        let id = PartUsageId::from_index(self.model.part_usages.len());
        self.model.part_usages.push(PartUsage {
            name: name.to_string(),
            composition,
            definition: PartRef {
                name: definition.to_string(),
                target: None,
            },
            location,
        });
        self.model.compositions[composition.index()]
            .usages
            .insert(name.to_string(), id);
        Ok(id)
    }

    /// Record `connect from to to` inside a composition.
    pub fn connect(
        &mut self,
        composition: CompositionId,
        from: Endpoint,
        to: Endpoint,
        location: SourceLocation,
    ) -> ConnectionId {
        let id = ConnectionId::from_index(self.model.connections.len());
        self.model.connections.push(Connection {
            composition,
            from,
            to,
            location,
        });
        self.model.compositions[composition.index()]
            .connections
            .push(id);
        id
    }

    pub fn add_requirement(
        &mut self,
        package: PackageId,
        identifier: &str,
        text: String,
        metrics: Vec<String>,
        location: SourceLocation,
    ) -> Result<RequirementId, AlreadyDeclared> {
        if let Some(&existing) = self.model.package(package).requirements.get(identifier) {
            return Err(AlreadyDeclared {
                previous: self.model.requirement(existing).location.clone(),
            });
        }
        let id = RequirementId::from_index(self.model.requirements.len());
        self.model.requirements.push(Requirement {
            identifier: identifier.to_string(),
            package,
            text,
            metrics,
            location,
        });
        self.model.packages[package.index()]
            .requirements
            .insert(identifier.to_string(), id);
        Ok(id)
    }

    // === Reference binding ===

    pub fn bind_port_type(&mut self, part: PartDefId, port: usize, target: DataTypeId) {
        if let Some(p) = self.model.part_defs[part.index()].ports.get_mut(port) {
            p.port_type.target = Some(target);
        }
    }

    pub fn bind_usage(&mut self, usage: PartUsageId, target: PartDefId) {
        self.model.part_usages[usage.index()].definition.target = Some(target);
    }

    pub fn bind_endpoint(
        &mut self,
        connection: ConnectionId,
        side: EndpointSide,
        target: EndpointTarget,
    ) {
        let conn = &mut self.model.connections[connection.index()];
        let endpoint = match side {
            EndpointSide::From => &mut conn.from,
            EndpointSide::To => &mut conn.to,
        };
        endpoint.target = Some(target);
    }

    /// Finish construction.
    pub fn build(self) -> ArchitectureModel {
        self.model
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_composition(
    model: &mut ArchitectureModel,
    name: String,
    owner: CompositionOwner,
) -> CompositionId {
    let id = CompositionId::from_index(model.compositions.len());
    model.compositions.push(Composition {
        name,
        owner,
        usages: IndexMap::new(),
        connections: Vec::new(),
    });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::FieldKind;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("arch.sysml", line, 1)
    }

    #[test]
    fn reopened_package_merges() {
        let mut b = ModelBuilder::new();
        let root = b.root();
        let first = b.package(root, "Nav", loc(1));
        let second = b.package(root, "Nav", loc(40));
        assert_eq!(first, second);
        let model = b.build();
        assert_eq!(model.package(first).locations.len(), 2);
        assert_eq!(model.packages().count(), 2);
    }

    #[test]
    fn duplicate_data_type_refused_with_first_location() {
        let mut b = ModelBuilder::new();
        let nav = b.package_path(&["Nav"]);
        let first = b
            .add_data_type(nav, "Vec3", vec![Field::real("x")], None, loc(2))
            .unwrap();
        let err = b
            .add_data_type(nav, "Vec3", vec![Field::real("y")], None, loc(9))
            .unwrap_err();
        assert_eq!(err.previous, loc(2));
        let model = b.build();
        assert_eq!(model.data_types().count(), 1);
        assert_eq!(model.data_type(first).fields[0].name, "x");
    }

    #[test]
    fn same_name_in_different_packages_allowed() {
        let mut b = ModelBuilder::new();
        let a = b.package_path(&["A"]);
        let c = b.package_path(&["C"]);
        assert!(b.add_data_type(a, "Vec3", vec![], None, loc(1)).is_ok());
        assert!(b.add_data_type(c, "Vec3", vec![], None, loc(2)).is_ok());
    }

    #[test]
    fn part_def_gets_own_composition() {
        let mut b = ModelBuilder::new();
        let sys = b.package_path(&["Sys"]);
        let vehicle = b.add_part_def(sys, "Vehicle", None, loc(1)).unwrap();
        let composition = b.model().part_def(vehicle).composition;
        let usage = b
            .add_part_usage(composition, "imu", "Imu", loc(2))
            .unwrap();
        assert!(b.add_part_usage(composition, "imu", "Imu", loc(3)).is_err());

        let model = b.build();
        let comp = model.composition(composition);
        assert_eq!(comp.name, "Sys::Vehicle");
        assert_eq!(comp.owner, CompositionOwner::Part(vehicle));
        assert_eq!(comp.usages.get("imu"), Some(&usage));
        assert_eq!(model.part_usage(usage).definition.target, None);
    }

    #[test]
    fn ports_and_attributes_unique_per_part() {
        let mut b = ModelBuilder::new();
        let root = b.root();
        let part = b.add_part_def(root, "Imu", None, loc(1)).unwrap();
        assert_eq!(b.add_port(part, Port::output("accel", "Vec3")), Ok(0));
        assert_eq!(b.add_port(part, Port::input("cfg", "Cfg")), Ok(1));
        assert!(b.add_port(part, Port::input("accel", "Vec3")).is_err());
        assert!(b
            .add_attribute(part, Field::new("rate", FieldKind::INTEGER))
            .is_ok());
        assert!(b.add_attribute(part, Field::real("rate")).is_err());
    }

    #[test]
    fn binding_sets_targets() {
        let mut b = ModelBuilder::new();
        let root = b.root();
        let vec3 = b.add_data_type(root, "Vec3", vec![], None, loc(1)).unwrap();
        let imu = b.add_part_def(root, "Imu", None, loc(2)).unwrap();
        let port = b.add_port(imu, Port::output("accel", "Vec3")).unwrap();
        let comp = b.model().package(root).composition;
        let usage = b.add_part_usage(comp, "imu", "Imu", loc(3)).unwrap();
        let conn = b.connect(
            comp,
            Endpoint::new("imu", "accel"),
            Endpoint::new("imu", "accel"),
            loc(4),
        );

        b.bind_port_type(imu, port, vec3);
        b.bind_usage(usage, imu);
        let target = EndpointTarget {
            usage,
            part: imu,
            port,
        };
        b.bind_endpoint(conn, EndpointSide::From, target);

        let model = b.build();
        assert_eq!(model.part_def(imu).ports[0].port_type.target, Some(vec3));
        assert_eq!(model.part_usage(usage).definition.target, Some(imu));
        assert_eq!(model.connection(conn).from.target, Some(target));
        assert_eq!(model.connection(conn).to.target, None);
        assert_eq!(model.port(target).name, "accel");
    }

    #[test]
    fn duplicate_imports_collapse() {
        let mut b = ModelBuilder::new();
        let pkg = b.package_path(&["Sys"]);
        b.add_import(pkg, vec!["Nav".into()]);
        b.add_import(pkg, vec!["Nav".into()]);
        assert_eq!(b.model().package(pkg).imports.len(), 1);
    }
}
