//! Writing generated artifacts to disk.
//!
//! Output layout below the configured output directory:
//!
//! ```text
//! <output>/interfaces/<Package>/package.mo
//! <output>/interfaces/<Package>/package.order
//! <output>/interfaces/<Package>/<Record>.mo
//! <output>/composition/<System>.ssd
//! <output>/composition/<System>.ssv
//! <output>/terminalsAndIcons.xml
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::composition::CompositionDocument;
use crate::error::{GenError, Result};
use crate::interface::{render_package, InterfaceDeclaration, InterfaceOptions};
use crate::parameters::generate_parameter_set;
use crate::terminals::{TerminalsDocument, TERMINALS_FILE};

/// Resolve the interface and composition directories below `output_dir`.
pub fn resolve_paths(output_dir: &Path) -> (PathBuf, PathBuf) {
    let interface_dir = output_dir.join("interfaces");
    let composition_dir = output_dir.join("composition");
    (interface_dir, composition_dir)
}

/// Write the interface package and one file per record into `dir`.
///
/// Returns the paths written, package files first.
pub fn write_interfaces(
    dir: &Path,
    options: &InterfaceOptions,
    declarations: &[InterfaceDeclaration],
) -> Result<Vec<PathBuf>> {
    let package_dir = dir.join(checked_name(&options.package)?);
    let (package_mo, package_order) = render_package(options, declarations);

    let mut written = vec![
        write_file(&package_dir.join("package.mo"), &package_mo)?,
        write_file(&package_dir.join("package.order"), &package_order)?,
    ];
    for declaration in declarations {
        let file_name = declaration.file_name();
        let file = checked_name(&file_name)?;
        written.push(write_file(&package_dir.join(file), &declaration.text)?);
    }
    debug!(dir = %package_dir.display(), files = written.len(), "wrote interface package");
    Ok(written)
}

/// Write a composition document and its parameter set into `dir`.
pub fn write_composition(dir: &Path, document: &CompositionDocument) -> Result<Vec<PathBuf>> {
    let stem = checked_name(&document.name)?;
    let ssd = write_file(&dir.join(format!("{stem}.ssd")), &document.to_xml())?;
    let parameters = generate_parameter_set(document);
    let ssv = write_file(&dir.join(format!("{stem}.ssv")), &parameters.to_xml())?;
    debug!(system = %document.name, "wrote composition");
    Ok(vec![ssd, ssv])
}

/// Write the terminals document directly into `output_dir`.
pub fn write_terminals(output_dir: &Path, document: &TerminalsDocument) -> Result<PathBuf> {
    let path = write_file(&output_dir.join(TERMINALS_FILE), &document.to_xml())?;
    debug!(terminals = document.terminals.len(), "wrote terminals");
    Ok(path)
}

fn checked_name(name: &str) -> Result<&str> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) || name == "." || name == ".." {
        Some("name is not a single path component")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(GenError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(name),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    let io_err = |source| GenError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{generate_compositions, CompositionOptions};
    use crate::interface::generate_interfaces;
    use crate::terminals::generate_terminals;
    use archweave_core::ArchitectureModel;

    fn compile(source: &str) -> ArchitectureModel {
        let tree = archweave_syntax::parse("arch.sysml", source).unwrap();
        archweave_resolve::Resolver::resolve(&[tree]).unwrap()
    }

    const SOURCE: &str = r#"
        data def Vec3 { x; y; z }
        part def Sensor { attribute gain = 1.0; out reading : Vec3; }
        part def Logger { in value : Vec3; }
        part sensor : Sensor;
        part logger : Logger;
        connect sensor.reading to logger.value;
    "#;

    #[test]
    fn paths() {
        let (interfaces, composition) = resolve_paths(Path::new("/tmp/out"));
        assert_eq!(interfaces, PathBuf::from("/tmp/out/interfaces"));
        assert_eq!(composition, PathBuf::from("/tmp/out/composition"));
    }

    #[test]
    fn writes_interface_package() {
        let dir = tempfile::tempdir().unwrap();
        let model = compile(SOURCE);
        let options = InterfaceOptions::default();
        let decls = generate_interfaces(&model, &options);
        let written = write_interfaces(dir.path(), &options, &decls).unwrap();

        let package = dir.path().join("GeneratedInterfaces");
        assert_eq!(
            written,
            [
                package.join("package.mo"),
                package.join("package.order"),
                package.join("Vec3.mo"),
            ]
        );
        let record = std::fs::read_to_string(package.join("Vec3.mo")).unwrap();
        assert_eq!(record, decls[0].text);
    }

    #[test]
    fn rewriting_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let model = compile(SOURCE);
        let options = InterfaceOptions::default();
        let decls = generate_interfaces(&model, &options);
        write_interfaces(dir.path(), &options, &decls).unwrap();
        let path = dir.path().join("GeneratedInterfaces").join("Vec3.mo");
        let first = std::fs::read(&path).unwrap();
        write_interfaces(dir.path(), &options, &generate_interfaces(&model, &options)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn writes_ssd_and_ssv() {
        let dir = tempfile::tempdir().unwrap();
        let model = compile(SOURCE);
        let docs = generate_compositions(&model, &CompositionOptions::default());
        let written = write_composition(dir.path(), &docs[0]).unwrap();
        assert_eq!(
            written,
            [dir.path().join("System.ssd"), dir.path().join("System.ssv")]
        );
        let ssv = std::fs::read_to_string(&written[1]).unwrap();
        assert!(ssv.contains("<ssv:Parameter name=\"sensor.gain\">"));
    }

    #[test]
    fn writes_terminals_at_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let document = generate_terminals(&compile(SOURCE));
        let path = write_terminals(dir.path(), &document).unwrap();
        assert_eq!(path, dir.path().join("terminalsAndIcons.xml"));
        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains(r#"<Terminal name="Logger_value" matchingRule="plug" terminalKind="Vec3">"#));
        assert!(xml.contains(r#"variableName="reading.x""#));
    }

    #[test]
    fn rejects_path_like_package_names() {
        let dir = tempfile::tempdir().unwrap();
        let options = InterfaceOptions {
            package: "../escape".into(),
        };
        let err = write_interfaces(dir.path(), &options, &[]).unwrap_err();
        assert!(matches!(err, GenError::InvalidName { .. }));
    }
}
