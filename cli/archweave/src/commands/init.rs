//! `archweave init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{ArchweaveManifest, MANIFEST_FILE};

const SAMPLE_ARCHITECTURE: &str = r#"data def Position {
    doc /* Position fix in a local frame */
    x; y; z
}

part def Sensor {
    doc /* Produces position fixes */
    out reading : Position;
    attribute rate : Real = 10.0;
}

part def Logger {
    in value : Position;
}

part sensor : Sensor;
part logger : Logger;

connect sensor.reading to logger.value;

requirement def LogPositions {
    doc /* The logger records every position fix. */
    metric logged_fraction;
}
"#;

/// Component models matching the sample architecture.
const SAMPLE_MODELS: &[(&str, &str)] = &[
    (
        "Sensor.mo",
        r#"model Sensor "Produces position fixes"
  output GeneratedInterfaces.Position reading;
  parameter Real rate = 10.0;
equation
  reading.x = time;
  reading.y = 0;
  reading.z = 0;
end Sensor;
"#,
    ),
    (
        "Logger.mo",
        r#"model Logger
  input GeneratedInterfaces.Position value;
end Logger;
"#,
    ),
];

/// Create a new archweave project at the given path.
///
/// `name` is the project name. The directory `name` is created relative to cwd.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    let architecture = project_dir.join("architecture");
    let models = project_dir.join("models");
    fs::create_dir_all(&architecture).context("creating architecture/ directory")?;
    fs::create_dir_all(&models).context("creating models/ directory")?;

    fs::write(project_dir.join(MANIFEST_FILE), ArchweaveManifest::template(name))
        .with_context(|| format!("writing {MANIFEST_FILE}"))?;
    fs::write(architecture.join("system.sysml"), SAMPLE_ARCHITECTURE)
        .context("writing architecture/system.sysml")?;
    for (file, text) in SAMPLE_MODELS {
        fs::write(models.join(file), text).with_context(|| format!("writing models/{file}"))?;
    }
    fs::write(project_dir.join(".gitignore"), "generated/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/architecture/system.sysml");
    for (file, _) in SAMPLE_MODELS {
        println!("  {name}/models/{file}");
    }
    println!("  {name}/.gitignore");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_project_structure() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("test-init-project");

        create_project(&project_path, "test-init-project").unwrap();

        assert!(project_path.join(MANIFEST_FILE).is_file());
        assert!(project_path.join("architecture/system.sysml").is_file());
        assert!(project_path.join("models/Sensor.mo").is_file());
        assert!(project_path.join("models/Logger.mo").is_file());
        assert_eq!(
            fs::read_to_string(project_path.join(".gitignore")).unwrap(),
            "generated/\n"
        );
    }

    #[test]
    fn init_generates_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("valid-manifest");

        create_project(&project_path, "valid-manifest").unwrap();

        let content = fs::read_to_string(project_path.join(MANIFEST_FILE)).unwrap();
        let manifest = ArchweaveManifest::from_str(&content).unwrap();
        assert_eq!(manifest.project.name, "valid-manifest");
    }

    #[test]
    fn sample_architecture_compiles() {
        let tree = archweave_syntax::parse("system.sysml", SAMPLE_ARCHITECTURE).unwrap();
        let model = archweave_resolve::Resolver::resolve(&[tree]).unwrap();
        assert_eq!(model.part_usages().count(), 2);
        assert_eq!(model.connections().count(), 1);
        assert_eq!(model.requirements().count(), 1);
    }

    #[test]
    fn init_refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("existing");
        fs::create_dir(&project_path).unwrap();

        let result = create_project(&project_path, "existing");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }
}
