//! Verification outcomes, violations, and the combined report.

use std::fmt;

use archweave_core::SourceLocation;
use serde::Serialize;

/// Stable tag identifying what a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    MissingInterface,
    FieldMismatch,
    UnknownEndpoint,
    TypeMismatch,
    DirectionMismatch,
    FanInConflict,
    MissingVariable,
    MissingModel,
    VariableTypeMismatch,
    UnexpectedVariable,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingInterface => "MissingInterface",
            Self::FieldMismatch => "FieldMismatch",
            Self::UnknownEndpoint => "UnknownEndpoint",
            Self::TypeMismatch => "TypeMismatch",
            Self::DirectionMismatch => "DirectionMismatch",
            Self::FanInConflict => "FanInConflict",
            Self::MissingVariable => "MissingVariable",
            Self::MissingModel => "MissingModel",
            Self::VariableTypeMismatch => "VariableTypeMismatch",
            Self::UnexpectedVariable => "UnexpectedVariable",
        }
    }

    /// Default severity for this kind of finding.
    pub fn severity(self) -> Severity {
        match self {
            // Inferred from a type name in hand-written source
            Self::VariableTypeMismatch => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARN"),
        }
    }
}

/// Where in the architecture a violation applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelLocation {
    /// Model path of the element, e.g. `Nav::Vec3.z` or `sensor.reading`.
    pub element: String,
    /// Source location of the declaration, when known.
    pub source: Option<SourceLocation>,
}

impl ModelLocation {
    pub fn new(element: impl Into<String>, source: Option<SourceLocation>) -> Self {
        Self {
            element: element.into(),
            source,
        }
    }
}

impl fmt::Display for ModelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} at {source}", self.element),
            None => f.write_str(&self.element),
        }
    }
}

/// One consistency failure found by a verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    pub location: ModelLocation,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>, location: ModelLocation) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.severity, self.kind, self.message, self.location
        )
    }
}

/// Result of one verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail(Vec<Violation>),
}

impl Outcome {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Pass
        } else {
            Self::Fail(violations)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Pass => &[],
            Self::Fail(violations) => violations,
        }
    }
}

/// The verifiers that make up a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Interface,
    Connection,
    Variable,
}

impl Check {
    pub const ALL: [Check; 3] = [Check::Interface, Check::Connection, Check::Variable];

    pub fn name(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Connection => "connection",
            Self::Variable => "variable",
        }
    }

    /// Parse a check name as written in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub outcome: Outcome,
}

/// Summary statistics for a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// The complete verification report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub summary: ReportSummary,
    pub results: Vec<CheckResult>,
}

impl VerificationReport {
    /// Build a report from the results of the checks that ran.
    pub fn build(results: Vec<CheckResult>) -> Self {
        let mut summary = ReportSummary {
            checks: results.len(),
            ..ReportSummary::default()
        };
        for result in &results {
            if result.outcome.is_pass() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            for violation in result.outcome.violations() {
                match violation.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                }
            }
        }
        Self { summary, results }
    }

    /// A run passes only when every check found nothing.
    pub fn is_pass(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_pass())
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.results.iter().flat_map(|r| r.outcome.violations())
    }

    pub fn result(&self, check: Check) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check == check)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Verification Report ===")?;
        writeln!(
            f,
            "Checks: {} | Passed: {} | Failed: {} | Errors: {} | Warnings: {}",
            self.summary.checks,
            self.summary.passed,
            self.summary.failed,
            self.summary.errors,
            self.summary.warnings,
        )?;
        for result in &self.results {
            match &result.outcome {
                Outcome::Pass => writeln!(f, "--- {}: PASSED ---", result.check)?,
                Outcome::Fail(violations) => {
                    writeln!(
                        f,
                        "--- {}: FAILED ({} violations) ---",
                        result.check,
                        violations.len()
                    )?;
                    for violation in violations {
                        writeln!(f, "{violation}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
