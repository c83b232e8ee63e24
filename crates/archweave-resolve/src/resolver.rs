//! Merging syntax trees into the architecture model.
//!
//! Resolution runs in two phases. The declaration phase walks every tree and
//! adds packages, data types, part definitions, usages, connections and
//! requirements to a [`ModelBuilder`], reporting names declared twice in the
//! same scope. The binding phase then looks up every reference by name once
//! all declarations are known, so declaration order across files never
//! matters.

use std::collections::HashMap;

use archweave_core::{
    ArchitectureModel, CompileError, CompositionId, ConnectionId, DeclKind, Endpoint,
    EndpointSide, EndpointTarget, Field, FieldDefault, FieldKind, ModelBuilder, PackageId,
    PartDefId, PartUsageId, Port, ScalarKind,
};
use archweave_syntax::ast::{
    ConnectDecl, DataDef, FieldDecl, Item, Literal, PartDef, PartUsageDecl, SyntaxTree,
};
use tracing::{debug, info};

use crate::scope::Scopes;

/// The outcome of resolution: the (possibly partial) model and every error.
///
/// When `errors` is non-empty the model still holds every declaration that
/// could be added; the first of any duplicated names wins and references
/// that failed to resolve are left unbound.
#[derive(Debug)]
pub struct Resolution {
    pub model: ArchitectureModel,
    pub errors: Vec<CompileError>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<ArchitectureModel, Vec<CompileError>> {
        if self.errors.is_empty() {
            Ok(self.model)
        } else {
            Err(self.errors)
        }
    }
}

/// Resolve a complete set of syntax trees.
pub fn resolve(trees: &[SyntaxTree]) -> Resolution {
    let mut resolver = Resolver::new();
    for tree in trees {
        resolver.add_tree(tree);
    }
    resolver.finish()
}

struct PendingPortType {
    part: PartDefId,
    port: usize,
    scope: PackageId,
}

struct PendingUsage {
    usage: PartUsageId,
    scope: PackageId,
}

/// Incremental resolver: feed trees with [`Resolver::add_tree`], then bind
/// with [`Resolver::finish`].
pub struct Resolver {
    builder: ModelBuilder,
    errors: Vec<CompileError>,
    port_types: Vec<PendingPortType>,
    usages: Vec<PendingUsage>,
    connections: Vec<ConnectionId>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            builder: ModelBuilder::new(),
            errors: Vec::new(),
            port_types: Vec::new(),
            usages: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Resolve trees into a model, failing with every error found.
    pub fn resolve(trees: &[SyntaxTree]) -> Result<ArchitectureModel, Vec<CompileError>> {
        resolve(trees).into_result()
    }

    /// Declaration phase for one file.
    pub fn add_tree(&mut self, tree: &SyntaxTree) {
        debug!(file = %tree.file, items = tree.items.len(), "merging syntax tree");
        let root = self.builder.root();
        self.declare_items(root, &tree.items);
    }

    fn declare_items(&mut self, package: PackageId, items: &[Item]) {
        let composition = self.builder.model().package(package).composition;
        for item in items {
            match item {
                Item::Package(decl) => {
                    let child = self
                        .builder
                        .package(package, &decl.name, decl.location.clone());
                    self.declare_items(child, &decl.items);
                }
                Item::Import(decl) => self.builder.add_import(package, decl.path.clone()),
                Item::DataDef(def) => self.declare_data_type(package, def),
                Item::PartDef(def) => self.declare_part_def(package, def),
                Item::PartUsage(decl) => self.declare_usage(package, composition, decl),
                Item::Connect(decl) => self.declare_connection(composition, decl),
                Item::Requirement(req) => {
                    let added = self.builder.add_requirement(
                        package,
                        &req.identifier,
                        req.text.clone(),
                        req.metrics.clone(),
                        req.location.clone(),
                    );
                    if let Err(dup) = added {
                        self.errors.push(CompileError::duplicate(
                            DeclKind::Requirement,
                            &req.identifier,
                            req.location.clone(),
                            dup.previous,
                        ));
                    }
                }
            }
        }
    }

    fn declare_data_type(&mut self, package: PackageId, def: &DataDef) {
        let fields = def
            .fields
            .iter()
            .filter_map(|f| self.convert_field(f))
            .collect();
        let added = self.builder.add_data_type(
            package,
            &def.name,
            fields,
            def.doc.clone(),
            def.location.clone(),
        );
        if let Err(dup) = added {
            self.errors.push(CompileError::duplicate(
                DeclKind::DataType,
                &def.name,
                def.location.clone(),
                dup.previous,
            ));
        }
    }

    fn declare_part_def(&mut self, package: PackageId, def: &PartDef) {
        let part = match self.builder.add_part_def(
            package,
            &def.name,
            def.doc.clone(),
            def.location.clone(),
        ) {
            Ok(id) => id,
            Err(dup) => {
                self.errors.push(CompileError::duplicate(
                    DeclKind::PartDef,
                    &def.name,
                    def.location.clone(),
                    dup.previous,
                ));
                return;
            }
        };

        for decl in &def.ports {
            let mut port = Port::new(&decl.name, decl.direction, &decl.ty.name)
                .at(decl.location.clone());
            port.doc = decl.doc.clone();
            match self.builder.add_port(part, port) {
                Ok(index) => self.port_types.push(PendingPortType {
                    part,
                    port: index,
                    scope: package,
                }),
                Err(dup) => self.errors.push(CompileError::duplicate(
                    DeclKind::Port,
                    &decl.name,
                    decl.location.clone(),
                    dup.previous,
                )),
            }
        }

        for decl in &def.attributes {
            let Some(field) = self.convert_field(decl) else {
                continue;
            };
            if let Err(dup) = self.builder.add_attribute(part, field) {
                self.errors.push(CompileError::duplicate(
                    DeclKind::Attribute,
                    &decl.name,
                    decl.location.clone(),
                    dup.previous,
                ));
            }
        }

        let composition = self.builder.model().part_def(part).composition;
        for usage in &def.parts {
            self.declare_usage(package, composition, usage);
        }
        for connection in &def.connections {
            self.declare_connection(composition, connection);
        }
    }

    fn declare_usage(
        &mut self,
        package: PackageId,
        composition: CompositionId,
        decl: &PartUsageDecl,
    ) {
        match self.builder.add_part_usage(
            composition,
            &decl.name,
            &decl.definition,
            decl.location.clone(),
        ) {
            Ok(usage) => self.usages.push(PendingUsage {
                usage,
                scope: package,
            }),
            Err(dup) => self.errors.push(CompileError::duplicate(
                DeclKind::PartUsage,
                &decl.name,
                decl.location.clone(),
                dup.previous,
            )),
        }
    }

    fn declare_connection(&mut self, composition: CompositionId, decl: &ConnectDecl) {
        let id = self.builder.connect(
            composition,
            Endpoint::new(&decl.from.usage, &decl.from.port),
            Endpoint::new(&decl.to.usage, &decl.to.port),
            decl.location.clone(),
        );
        self.connections.push(id);
    }

    /// Turn a field declaration into a model field.
    ///
    /// A field whose type is not a known scalar is dropped with an
    /// `UnresolvedReference`; a bad default is dropped with `InvalidDefault`
    /// while the field itself is kept.
    fn convert_field(&mut self, decl: &FieldDecl) -> Option<Field> {
        let kind = match &decl.ty {
            None => FieldKind::REAL,
            Some(ty) => {
                let Some(scalar) = ScalarKind::from_type_name(&ty.name) else {
                    self.errors
                        .push(CompileError::unresolved(&ty.name, ty.location.clone()));
                    return None;
                };
                match ty.array_len {
                    Some(len) => FieldKind::ArrayOf(scalar, len),
                    None => FieldKind::Scalar(scalar),
                }
            }
        };

        let default = decl.default.as_ref().and_then(|literal| {
            let default = match literal {
                Literal::Scalar(value) => FieldDefault::Scalar(value.clone()),
                Literal::List(values) => FieldDefault::PerIndex(values.clone()),
            };
            match default.check(kind) {
                Ok(()) => Some(default),
                Err(message) => {
                    self.errors.push(CompileError::InvalidDefault {
                        name: decl.name.clone(),
                        location: decl.location.clone(),
                        message,
                    });
                    None
                }
            }
        });

        Some(Field {
            name: decl.name.clone(),
            kind,
            default,
            doc: decl.doc.clone(),
            location: decl.location.clone(),
        })
    }

    /// Binding phase: resolve every reference and return the model.
    pub fn finish(mut self) -> Resolution {
        let model = self.builder.model();
        let scopes = Scopes::new(model);
        let mut errors = Vec::new();

        let mut port_bindings = Vec::new();
        for pending in &self.port_types {
            let port = &model.part_def(pending.part).ports[pending.port];
            match scopes.data_type(pending.scope, &port.port_type.name) {
                Some(target) => port_bindings.push((pending.part, pending.port, target)),
                None => errors.push(CompileError::unresolved(
                    &port.port_type.name,
                    port.location.clone(),
                )),
            }
        }

        let mut usage_targets = HashMap::new();
        for pending in &self.usages {
            let usage = model.part_usage(pending.usage);
            match scopes.part_def(pending.scope, &usage.definition.name) {
                Some(target) => {
                    usage_targets.insert(pending.usage, target);
                }
                None => errors.push(CompileError::unresolved(
                    &usage.definition.name,
                    usage.location.clone(),
                )),
            }
        }

        let mut endpoint_bindings = Vec::new();
        for &id in &self.connections {
            let connection = model.connection(id);
            let composition = model.composition(connection.composition);
            for (side, endpoint) in [
                (EndpointSide::From, &connection.from),
                (EndpointSide::To, &connection.to),
            ] {
                let Some(&usage) = composition.usages.get(&endpoint.usage) else {
                    errors.push(CompileError::unresolved(
                        endpoint.to_string(),
                        connection.location.clone(),
                    ));
                    continue;
                };
                // An unbound usage has already been reported.
                let Some(&part) = usage_targets.get(&usage) else {
                    continue;
                };
                match model.part_def(part).port(&endpoint.port) {
                    Some((port, _)) => endpoint_bindings.push((
                        id,
                        side,
                        EndpointTarget { usage, part, port },
                    )),
                    None => errors.push(CompileError::unresolved(
                        endpoint.to_string(),
                        connection.location.clone(),
                    )),
                }
            }
        }

        for (part, port, target) in port_bindings {
            self.builder.bind_port_type(part, port, target);
        }
        for (usage, target) in usage_targets {
            self.builder.bind_usage(usage, target);
        }
        for (connection, side, target) in endpoint_bindings {
            self.builder.bind_endpoint(connection, side, target);
        }

        self.errors.extend(errors);
        sort_errors(&mut self.errors);

        let model = self.builder.build();
        info!(
            data_types = model.data_types().count(),
            part_defs = model.part_defs().count(),
            part_usages = model.part_usages().count(),
            connections = model.connections().count(),
            errors = self.errors.len(),
            "architecture resolved"
        );
        Resolution {
            model,
            errors: self.errors,
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Order errors by source location so output is stable across runs.
fn sort_errors(errors: &mut [CompileError]) {
    errors.sort_by(|a, b| a.location().cmp(b.location()));
}
