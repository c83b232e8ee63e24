//! Verification engine orchestrator.
//!
//! The three checks only read the model and their own inputs, so they run
//! concurrently on the rayon pool and are collected into one report.

use archweave_core::ArchitectureModel;
use tracing::{info, warn};

use crate::connection::ConnectionVerifier;
use crate::interface::{InterfaceArtifact, InterfaceVerifier};
use crate::report::{Check, CheckResult, Outcome, VerificationReport};
use crate::variable::{ModelSource, VariableVerifier};

/// External artifacts the checks compare against.
///
/// A check whose artifacts are `None` is skipped.
#[derive(Debug, Clone, Default)]
pub struct VerificationInputs {
    pub interfaces: Option<Vec<InterfaceArtifact>>,
    pub models: Option<Vec<ModelSource>>,
}

/// Runs the enabled checks over a model.
pub struct VerificationEngine {
    checks: Vec<Check>,
}

impl VerificationEngine {
    /// An engine running every check.
    pub fn new() -> Self {
        Self {
            checks: Check::ALL.to_vec(),
        }
    }

    /// An engine running only `checks`.
    pub fn with_checks(checks: impl IntoIterator<Item = Check>) -> Self {
        let mut selected: Vec<Check> = Vec::new();
        for check in checks {
            if !selected.contains(&check) {
                selected.push(check);
            }
        }
        Self { checks: selected }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Run the enabled checks and build the report.
    ///
    /// Results appear in the fixed order interface, connection, variable.
    pub fn verify(&self, model: &ArchitectureModel, inputs: &VerificationInputs) -> VerificationReport {
        let enabled = |check: Check| self.checks.contains(&check);

        let (interface, (connection, variable)) = rayon::join(
            || {
                if !enabled(Check::Interface) {
                    return None;
                }
                match &inputs.interfaces {
                    Some(artifacts) => Some(InterfaceVerifier::verify(model, artifacts)),
                    None => {
                        warn!("no interface artifacts available, skipping interface check");
                        None
                    }
                }
            },
            || {
                rayon::join(
                    || enabled(Check::Connection).then(|| ConnectionVerifier::verify(model)),
                    || {
                        if !enabled(Check::Variable) {
                            return None;
                        }
                        match &inputs.models {
                            Some(sources) => Some(VariableVerifier::verify(model, sources)),
                            None => {
                                warn!("no component models available, skipping variable check");
                                None
                            }
                        }
                    },
                )
            },
        );

        let results: Vec<CheckResult> = [
            (Check::Interface, interface),
            (Check::Connection, connection),
            (Check::Variable, variable),
        ]
        .into_iter()
        .filter_map(|(check, outcome): (Check, Option<Outcome>)| {
            outcome.map(|outcome| CheckResult { check, outcome })
        })
        .collect();

        let report = VerificationReport::build(results);
        info!(
            checks = report.summary.checks,
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            "verification complete"
        );
        report
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}
