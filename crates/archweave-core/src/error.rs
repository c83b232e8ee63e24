//! Compile errors reported by the parser and resolver.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::location::SourceLocation;

/// Kind of declaration involved in a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Package,
    DataType,
    PartDef,
    PartUsage,
    Port,
    Attribute,
    Field,
    Requirement,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Package => "package",
            Self::DataType => "data type",
            Self::PartDef => "part definition",
            Self::PartUsage => "part usage",
            Self::Port => "port",
            Self::Attribute => "attribute",
            Self::Field => "field",
            Self::Requirement => "requirement",
        };
        f.write_str(label)
    }
}

/// A problem found while turning architecture sources into a model.
///
/// Generation is all-or-nothing: a single compile error anywhere prevents
/// every artifact from being written.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum CompileError {
    #[error("{location}: syntax error: {message} (found {found})")]
    SyntaxError {
        location: SourceLocation,
        found: String,
        message: String,
    },

    #[error("{location}: duplicate {kind} '{name}', first declared at {previous}")]
    DuplicateDeclaration {
        #[serde(rename = "declaration")]
        kind: DeclKind,
        name: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    #[error("{location}: unresolved reference '{name}'")]
    UnresolvedReference {
        name: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid default for '{name}': {message}")]
    InvalidDefault {
        name: String,
        location: SourceLocation,
        message: String,
    },
}

impl CompileError {
    /// Stable tag naming the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyntaxError { .. } => "SyntaxError",
            Self::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            Self::UnresolvedReference { .. } => "UnresolvedReference",
            Self::InvalidDefault { .. } => "InvalidDefault",
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::SyntaxError { location, .. }
            | Self::DuplicateDeclaration { location, .. }
            | Self::UnresolvedReference { location, .. }
            | Self::InvalidDefault { location, .. } => location,
        }
    }

    pub fn duplicate(
        kind: DeclKind,
        name: impl Into<String>,
        location: SourceLocation,
        previous: SourceLocation,
    ) -> Self {
        Self::DuplicateDeclaration {
            kind,
            name: name.into(),
            location,
            previous,
        }
    }

    pub fn unresolved(name: impl Into<String>, location: SourceLocation) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            location,
        }
    }
}
