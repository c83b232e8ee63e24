//! `archweave verify` — consistency checks against generated and
//! hand-written artifacts.

use std::path::Path;

use anyhow::{bail, Context, Result};
use archweave_core::CompileError;
use archweave_verify::{
    load_interfaces, load_models, VerificationEngine, VerificationInputs, VerificationReport,
    VerifyError,
};
use serde::Serialize;
use tracing::warn;

use crate::manifest::ArchweaveManifest;
use crate::pipeline::{compile, report_errors};

/// Machine-readable output of a verification run.
#[derive(Serialize)]
struct JsonReport<'a> {
    project: &'a str,
    compile_errors: &'a [CompileError],
    #[serde(flatten)]
    report: &'a VerificationReport,
}

/// Run verification on the project's architecture.
///
/// Compile errors do not stop the checks: they run over whatever part of
/// the model could be built. The command fails if there are compile errors
/// or violations of either severity.
pub fn run(
    project_dir: &Path,
    manifest: &ArchweaveManifest,
    status_only: bool,
    report_format: Option<&str>,
) -> Result<()> {
    let (errors, report) = verify(project_dir, manifest)?;

    if status_only {
        println!("Verification status:");
        println!("  Compile errors: {}", errors.len());
        println!("  Checks:         {}", report.summary.checks);
        println!("  Passed:         {}", report.summary.passed);
        println!("  Failed:         {}", report.summary.failed);
        println!("  Errors:         {}", report.summary.errors);
        println!("  Warnings:       {}", report.summary.warnings);
    } else {
        match report_format {
            Some("json") => {
                let json = JsonReport {
                    project: &manifest.project.name,
                    compile_errors: &errors,
                    report: &report,
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            None | Some("human") => {
                report_errors(&errors);
                print!("{report}");
            }
            Some(other) => bail!("unknown report format '{other}' (expected human or json)"),
        }
    }

    let violations = report.violations().count();
    if !errors.is_empty() || violations > 0 {
        bail!(
            "verification failed: {} compile error(s), {} violation(s)",
            errors.len(),
            violations
        );
    }
    Ok(())
}

pub(crate) fn verify(
    project_dir: &Path,
    manifest: &ArchweaveManifest,
) -> Result<(Vec<CompileError>, VerificationReport)> {
    let compiled = compile(project_dir, manifest)?;
    let engine = VerificationEngine::with_checks(manifest.checks()?);

    let interfaces_dir = manifest.interfaces_dir(project_dir);
    let models_dir = manifest.models_dir(project_dir);
    let inputs = VerificationInputs {
        interfaces: Some(
            or_empty(load_interfaces(&interfaces_dir))
                .with_context(|| format!("loading interfaces from {}", interfaces_dir.display()))?,
        ),
        models: Some(
            or_empty(load_models(&models_dir))
                .with_context(|| format!("loading models from {}", models_dir.display()))?,
        ),
    };

    let report = engine.verify(&compiled.model, &inputs);
    Ok((compiled.errors, report))
}

/// A missing artifact directory is an empty artifact set: every data type or
/// used part is then reported as lacking its artifact.
fn or_empty<T>(loaded: archweave_verify::Result<Vec<T>>) -> archweave_verify::Result<Vec<T>> {
    match loaded {
        Err(VerifyError::NotFound { path }) => {
            warn!(path = %path.display(), "artifact directory not found");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_verify::{Check, ViolationKind};

    fn project(source: &str, models: &[(&str, &str)]) -> (tempfile::TempDir, ArchweaveManifest) {
        let dir = tempfile::tempdir().unwrap();
        let arch = dir.path().join("architecture");
        std::fs::create_dir_all(&arch).unwrap();
        std::fs::write(arch.join("system.sysml"), source).unwrap();
        if !models.is_empty() {
            let models_dir = dir.path().join("models");
            std::fs::create_dir_all(&models_dir).unwrap();
            for (name, text) in models {
                std::fs::write(models_dir.join(name), text).unwrap();
            }
        }
        let manifest = ArchweaveManifest::implicit(dir.path());
        (dir, manifest)
    }

    fn kinds(report: &VerificationReport) -> Vec<ViolationKind> {
        report.violations().map(|v| v.kind).collect()
    }

    #[test]
    fn connection_mismatch_reported() {
        let (dir, manifest) = project(
            r#"
            data def Vec3 { x; y; z }
            data def Scalar { value }
            part def Sensor { out reading : Vec3; }
            part def Logger { in value : Scalar; }
            part sensorInstance : Sensor;
            part loggerInstance : Logger;
            connect sensorInstance.reading to loggerInstance.value;
            "#,
            &[],
        );
        let (errors, report) = verify(dir.path(), &manifest).unwrap();
        assert!(errors.is_empty());
        let connection = report.result(Check::Connection).unwrap();
        let violations = connection.outcome.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::TypeMismatch);
        assert!(run(dir.path(), &manifest, true, None).is_err());
    }

    #[test]
    fn missing_artifact_directories_fail_every_element() {
        let (dir, manifest) = project(
            "data def Vec3 { x; y; z }\npart def Sensor { out r : Vec3; }\npart s : Sensor;\n",
            &[],
        );
        let (errors, report) = verify(dir.path(), &manifest).unwrap();
        assert!(errors.is_empty());
        assert_eq!(report.summary.checks, 3);
        assert_eq!(
            kinds(&report),
            [ViolationKind::MissingInterface, ViolationKind::MissingModel]
        );
        let err = run(dir.path(), &manifest, true, None).unwrap_err();
        assert!(err.to_string().contains("2 violation(s)"));
    }

    #[test]
    fn compile_errors_do_not_stop_checks() {
        let (dir, manifest) = project(
            r#"
            data def Vec3 { x; y; z }
            part def Logger { in value : Vec3; in extra : Missing; }
            part a : Logger;
            part b : Logger;
            connect a.value to b.value;
            "#,
            &[],
        );
        let (errors, report) = verify(dir.path(), &manifest).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "UnresolvedReference");
        assert_eq!(
            kinds(&report),
            [
                ViolationKind::MissingInterface,
                ViolationKind::DirectionMismatch,
                ViolationKind::MissingModel,
            ]
        );
    }

    #[test]
    fn missing_model_detected() {
        let (dir, manifest) = project(
            "data def Vec3 { x; y; z }\npart def Sensor { out reading : Vec3; }\npart s : Sensor;\n",
            &[("Other.mo", "model Other\nend Other;\n")],
        );
        let (_, report) = verify(dir.path(), &manifest).unwrap();
        let variable = report.result(Check::Variable).unwrap();
        assert_eq!(variable.outcome.violations()[0].kind, ViolationKind::MissingModel);
    }

    #[test]
    fn unknown_report_format_rejected() {
        let (dir, manifest) = project("data def Vec3 { x; y; z }", &[]);
        let err = run(dir.path(), &manifest, false, Some("xml")).unwrap_err();
        assert!(err.to_string().contains("unknown report format"));
    }

    #[test]
    fn json_report_serializes() {
        let (dir, manifest) = project("data def Vec3 { x; y; z }", &[]);
        let (errors, report) = verify(dir.path(), &manifest).unwrap();
        let json = serde_json::to_value(JsonReport {
            project: &manifest.project.name,
            compile_errors: &errors,
            report: &report,
        })
        .unwrap();
        assert_eq!(json["summary"]["checks"], 3);
        assert_eq!(json["summary"]["errors"], 1);
        assert_eq!(json["results"][0]["check"], "interface");
        assert_eq!(json["results"][0]["outcome"]["status"], "fail");
        assert_eq!(
            json["results"][0]["outcome"]["violations"][0]["kind"],
            "MissingInterface"
        );
        assert_eq!(json["results"][1]["outcome"]["status"], "pass");
    }
}
