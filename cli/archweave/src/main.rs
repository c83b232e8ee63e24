//! archweave CLI — compile architecture descriptions into interface records
//! and system structure files, and check them for consistency.

mod commands;
mod logging;
mod manifest;
mod pipeline;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use manifest::ArchweaveManifest;

#[derive(Parser)]
#[command(name = "archweave", version, about = "Architecture description compiler")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archweave project
    Init {
        /// Project name
        name: String,
    },
    /// Generate interface records and system structure files
    Generate {
        /// Output directory (default: [generate] output in archweave.toml)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the architecture against generated and hand-written artifacts
    Verify {
        /// Report format (human, json)
        #[arg(long)]
        report: Option<String>,
        /// Print summary status only
        #[arg(long)]
        status: bool,
    },
    /// Show the resolved architecture model
    Inspect {
        /// Output format (text, json)
        #[arg(long)]
        export: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Generate { out } => {
            let (manifest, project_dir) = load_manifest_or_implicit(&cwd)?;
            commands::generate::run(&project_dir, &manifest, out.as_deref())
        }

        Commands::Verify { report, status } => {
            let (manifest, project_dir) = load_manifest_or_implicit(&cwd)?;
            commands::verify::run(&project_dir, &manifest, status, report.as_deref())
        }

        Commands::Inspect { export } => {
            let (manifest, project_dir) = load_manifest_or_implicit(&cwd)?;
            commands::inspect::run(&project_dir, &manifest, export.as_deref())
        }
    }
}

/// Load the manifest from the current directory upward, or fall back to
/// defaults rooted at the current directory.
fn load_manifest_or_implicit(cwd: &Path) -> anyhow::Result<(ArchweaveManifest, PathBuf)> {
    match ArchweaveManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => {
            tracing::debug!(dir = %cwd.display(), "no archweave.toml found, using defaults");
            Ok((ArchweaveManifest::implicit(cwd), cwd.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use archweave_verify::Check;

    /// Full workflow: init → generate → verify.
    #[test]
    fn init_generate_verify_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("workflow-test");

        // 1. Init
        commands::init::create_project(&project_path, "workflow-test").unwrap();

        // 2. Generate from the sample architecture
        let (manifest, project_dir) = load_manifest_or_implicit(&project_path).unwrap();
        assert_eq!(project_dir, project_path);
        commands::generate::run(&project_dir, &manifest, None).unwrap();
        let composition = project_path.join("generated/composition");
        assert!(composition.join("workflow-test.ssd").is_file());
        assert!(composition.join("workflow-test.ssv").is_file());

        // 3. Verify against the generated records and the sample models
        let (errors, report) = commands::verify::verify(&project_dir, &manifest).unwrap();
        assert!(errors.is_empty());
        assert_eq!(report.summary.checks, 3);
        assert!(report.is_pass(), "{report}");
        commands::verify::run(&project_dir, &manifest, false, Some("json")).unwrap();

        // 4. Inspect
        commands::inspect::run(&project_dir, &manifest, None).unwrap();
    }

    /// Interface drift: editing a data type after generation is caught
    /// against the previously generated records.
    #[test]
    fn stale_interfaces_detected() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("drift");
        commands::init::create_project(&project_path, "drift").unwrap();
        let (manifest, project_dir) = load_manifest_or_implicit(&project_path).unwrap();
        commands::generate::run(&project_dir, &manifest, None).unwrap();

        let source = project_path.join("architecture/system.sysml");
        let text = std::fs::read_to_string(&source).unwrap();
        std::fs::write(&source, text.replace("x; y; z", "x; y")).unwrap();

        let (_, report) = commands::verify::verify(&project_dir, &manifest).unwrap();
        let interface = report.result(Check::Interface).unwrap();
        let violations = interface.outcome.violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("`z`"));
        assert!(commands::verify::run(&project_dir, &manifest, true, None).is_err());
    }

    #[test]
    fn implicit_manifest_without_archweave_toml() {
        let dir = tempfile::tempdir().unwrap();
        let (manifest, project_dir) = load_manifest_or_implicit(dir.path()).unwrap();
        assert_eq!(project_dir, dir.path());
        assert_eq!(manifest.architecture.extension, "sysml");
    }

    #[test]
    fn cli_parses_global_verbose() {
        let cli = Cli::try_parse_from(["archweave", "verify", "--report", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Verify { report: Some(ref r), status: false } if r == "json"
        ));
    }
}
