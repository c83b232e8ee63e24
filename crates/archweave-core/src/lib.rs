//! Core data structures for the archweave architecture compiler.
//!
//! The [`ArchitectureModel`] is the single source of truth produced by the
//! resolver and consumed, read-only, by every generator and verifier.
//! Declarations live in arenas addressed by stable integer ids; cross
//! references (port types, part usage definitions, connection endpoints) are
//! bound once and cached as ids.
//!
//! ## Modules
//!
//! - [`model`] — the arena, ids, and declaration types
//! - [`kind`] — field kinds and literal values
//! - [`port`] — typed, directioned ports
//! - [`builder`] — the only mutation API for building a model
//! - [`location`] — source locations carried by every declaration
//! - [`error`] — the compile error taxonomy shared by parser and resolver

pub mod builder;
pub mod error;
pub mod kind;
pub mod location;
pub mod model;
pub mod port;

pub use builder::{AlreadyDeclared, ModelBuilder};
pub use error::{CompileError, DeclKind};
pub use kind::{Field, FieldDefault, FieldKind, ScalarKind, Value};
pub use location::SourceLocation;
pub use model::{
    ArchitectureModel, Composition, CompositionId, CompositionOwner, Connection, ConnectionId,
    DataTypeDefinition, DataTypeId, Endpoint, EndpointSide, EndpointTarget, Package, PackageId,
    PartDefId, PartDefinition, PartRef, PartUsage, PartUsageId, Requirement, RequirementId,
};
pub use port::{Port, PortDirection, TypeRef};
