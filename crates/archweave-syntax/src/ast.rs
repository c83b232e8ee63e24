//! Syntax tree for one architecture source file.
//!
//! Names are kept exactly as written; nothing in the tree refers to
//! declarations in other files. Cross-file binding is the resolver's job.

use archweave_core::{PortDirection, SourceLocation, Value};

/// Everything declared in one file.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    pub file: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Package(PackageDecl),
    Import(ImportDecl),
    DataDef(DataDef),
    PartDef(PartDef),
    PartUsage(PartUsageDecl),
    Connect(ConnectDecl),
    Requirement(RequirementDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    pub name: String,
    pub items: Vec<Item>,
    pub location: SourceLocation,
}

/// `import Nav::*;` or `import Nav::Vec3;`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: Vec<String>,
    pub wildcard: bool,
    pub location: SourceLocation,
}

/// The keyword a data definition was introduced with. All three declare a
/// data type; the keyword is kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKeyword {
    Data,
    Attribute,
    Port,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataDef {
    pub keyword: DataKeyword,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

/// A type written as `Name`, `Pkg::Name` or `Name[N]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub array_len: Option<usize>,
    pub location: SourceLocation,
}

/// A default written as a single literal or as a bracketed list.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Scalar(Value),
    List(Vec<Value>),
}

/// A data type field or part attribute. A missing type means Real.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Literal>,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortDecl {
    pub name: String,
    pub direction: PortDirection,
    pub ty: TypeExpr,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartDef {
    pub name: String,
    pub ports: Vec<PortDecl>,
    pub attributes: Vec<FieldDecl>,
    pub parts: Vec<PartUsageDecl>,
    pub connections: Vec<ConnectDecl>,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

/// `part name : Definition;`
#[derive(Debug, Clone, PartialEq)]
pub struct PartUsageDecl {
    pub name: String,
    pub definition: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDecl {
    pub usage: String,
    pub port: String,
    pub location: SourceLocation,
}

/// `connect a.p to b.q;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectDecl {
    pub from: EndpointDecl,
    pub to: EndpointDecl,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementDecl {
    pub identifier: String,
    pub text: String,
    pub metrics: Vec<String>,
    pub location: SourceLocation,
}
