//! Consistency verification for archweave.
//!
//! Three independent, read-only checks compare a resolved
//! [`ArchitectureModel`](archweave_core::ArchitectureModel) against itself and
//! against external artifacts:
//!
//! - [`interface`] — interface records match data types field for field
//! - [`connection`] — connections join existing, same-typed, opposite ports
//! - [`variable`] — component models declare a variable for every port
//!
//! [`engine::VerificationEngine`] runs the enabled checks concurrently and
//! collects their outcomes into a [`report::VerificationReport`].

pub mod connection;
pub mod engine;
pub mod interface;
pub mod modelica;
pub mod report;
pub mod variable;

mod error;

pub use connection::ConnectionVerifier;
pub use engine::{VerificationEngine, VerificationInputs};
pub use error::{Result, VerifyError};
pub use interface::{load_interfaces, ArtifactField, InterfaceArtifact, InterfaceVerifier};
pub use report::{
    Check, CheckResult, ModelLocation, Outcome, ReportSummary, Severity, VerificationReport,
    Violation, ViolationKind,
};
pub use variable::{load_models, ModelSource, ModelVariable, VariableVerifier};
