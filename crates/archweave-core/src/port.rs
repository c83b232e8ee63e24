//! Port model for part definitions.
//!
//! Ports define the typed inputs and outputs of a part, giving each part a
//! well-defined interface for signal flow between instances.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::SourceLocation;
use crate::model::DataTypeId;

/// Direction of a port on a part definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Signals flow into the part.
    In,
    /// Signals flow out of the part.
    Out,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }

    /// Keyword used in architecture sources.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// Modelica causality prefix.
    pub fn causality(self) -> &'static str {
        match self {
            Self::In => "input",
            Self::Out => "output",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A reference to a data type by name, bound to its id once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// The name as written, possibly `::`-qualified.
    pub name: String,
    pub target: Option<DataTypeId>,
}

impl TypeRef {
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }

    /// Last `::` segment of the written name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// A typed port on a part definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    /// The data type flowing through this port.
    pub port_type: TypeRef,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

impl Port {
    /// Create an input port.
    pub fn input(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::In, type_name)
    }

    /// Create an output port.
    pub fn output(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Out, type_name)
    }

    pub fn new(
        name: impl Into<String>,
        direction: PortDirection,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            port_type: TypeRef::unresolved(type_name),
            doc: None,
            location: SourceLocation::synthetic(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}
