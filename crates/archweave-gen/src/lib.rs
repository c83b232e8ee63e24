//! Artifact generation for archweave.
//!
//! Every generator is a pure function of a resolved
//! [`ArchitectureModel`](archweave_core::ArchitectureModel): the same model
//! always yields byte-identical text. Writing that text to disk is kept
//! separate, in [`emit`].
//!
//! - [`interface`] — Modelica records, one per data type
//! - [`composition`] — SSP system structure descriptions, one per composition
//! - [`parameters`] — SSV parameter sets with attribute defaults
//! - [`terminals`] — FMI terminal definitions, one terminal per port
//! - [`emit`] — output layout and file writing

pub mod composition;
pub mod emit;
pub mod interface;
pub mod parameters;
pub mod terminals;

mod error;
mod xml;

pub use composition::{
    generate_compositions, parameter_connectors, ComponentEntry, CompositionDocument,
    CompositionOptions, ParameterConnector, SignalConnector, WiringEntry,
};
pub use emit::{resolve_paths, write_composition, write_interfaces, write_terminals};
pub use error::{GenError, Result};
pub use interface::{
    generate_interfaces, render_package, InterfaceDeclaration, InterfaceOptions,
    DEFAULT_INTERFACE_PACKAGE,
};
pub use parameters::{generate_parameter_set, ParameterSet, ParameterValue};
pub use terminals::{
    generate_terminals, Terminal, TerminalMember, TerminalsDocument, TERMINALS_FILE,
};
