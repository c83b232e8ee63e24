//! Name lookup through package scopes.

use archweave_core::{ArchitectureModel, DataTypeId, Package, PackageId, PartDefId};
use indexmap::IndexMap;
use tracing::debug;

/// What an import statement brought into scope.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Imported {
    /// Every member of a package (`import Nav::*`, or `import Nav`).
    Package(PackageId),
    /// A single member (`import Nav::Vec3`).
    Member(PackageId, String),
}

/// Lookup tables derived from a model whose declarations are complete.
pub(crate) struct Scopes<'m> {
    model: &'m ArchitectureModel,
    /// Resolved imports, indexed by package.
    imports: Vec<Vec<Imported>>,
}

impl<'m> Scopes<'m> {
    pub(crate) fn new(model: &'m ArchitectureModel) -> Self {
        let mut scopes = Self {
            model,
            imports: Vec::new(),
        };
        scopes.imports = model
            .packages()
            .map(|(id, pkg)| {
                pkg.imports
                    .iter()
                    .filter_map(|path| scopes.resolve_import(id, path))
                    .collect()
            })
            .collect();
        scopes
    }

    fn resolve_import(&self, from: PackageId, path: &[String]) -> Option<Imported> {
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        for scope in self.ancestors(from) {
            if let Some(pkg) = self.model.descend(scope, &segments) {
                return Some(Imported::Package(pkg));
            }
            if let Some((member, parent)) = segments.split_last() {
                if let Some(pkg) = self.model.descend(scope, parent) {
                    if !parent.is_empty() {
                        return Some(Imported::Member(pkg, member.to_string()));
                    }
                }
            }
        }
        debug!(
            package = %self.model.package(from).qualified_name(),
            import = %path.join("::"),
            "ignoring import of unknown package"
        );
        None
    }

    /// `from` followed by each enclosing package up to and including the root.
    fn ancestors(&self, from: PackageId) -> Vec<PackageId> {
        let mut chain = vec![from];
        let mut current = from;
        while let Some(parent) = self.model.package(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub(crate) fn data_type(&self, from: PackageId, name: &str) -> Option<DataTypeId> {
        self.lookup(from, name, data_types)
    }

    pub(crate) fn part_def(&self, from: PackageId, name: &str) -> Option<PartDefId> {
        self.lookup(from, name, part_defs)
    }

    /// Look `name` up from package `from`: enclosing packages (innermost
    /// first, root excluded), then imports, then the root package.
    fn lookup<T: Copy>(
        &self,
        from: PackageId,
        name: &str,
        table: fn(&Package) -> &IndexMap<String, T>,
    ) -> Option<T> {
        let segments: Vec<&str> = name.split("::").collect();
        let (simple, path) = segments.split_last()?;
        let root = self.model.root();
        let within = |pkg: PackageId| -> Option<T> {
            let target = self.model.descend(pkg, path)?;
            table(self.model.package(target)).get(*simple).copied()
        };

        let ancestors = self.ancestors(from);
        if let Some(found) = ancestors.iter().filter(|p| **p != root).find_map(|p| within(*p)) {
            return Some(found);
        }

        for pkg in &ancestors {
            for import in &self.imports[pkg.index()] {
                let found = match import {
                    Imported::Package(target) => within(*target),
                    Imported::Member(target, member) if path.is_empty() && member == simple => {
                        table(self.model.package(*target)).get(*simple).copied()
                    }
                    Imported::Member(..) => None,
                };
                if found.is_some() {
                    return found;
                }
            }
        }

        within(root)
    }
}

fn data_types(pkg: &Package) -> &IndexMap<String, DataTypeId> {
    &pkg.data_types
}

fn part_defs(pkg: &Package) -> &IndexMap<String, PartDefId> {
    &pkg.part_defs
}
