//! Modelica record generation.
//!
//! Each data type becomes one record inside a single Modelica package. Field
//! order, names, and kinds follow the data type exactly; array fields stay
//! arrays (`Real samples[10];`) rather than being expanded.

use archweave_core::{ArchitectureModel, DataTypeId, Field, FieldDefault, FieldKind, ScalarKind, Value};
use tracing::debug;

/// Package name used when none is configured.
pub const DEFAULT_INTERFACE_PACKAGE: &str = "GeneratedInterfaces";

/// Options for interface generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceOptions {
    /// Modelica package that contains every generated record.
    pub package: String,
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            package: DEFAULT_INTERFACE_PACKAGE.to_string(),
        }
    }
}

/// One generated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDeclaration {
    /// Record name, see [`ArchitectureModel::interface_name`].
    pub name: String,
    pub data_type: DataTypeId,
    /// Complete Modelica source of the record file.
    pub text: String,
}

impl InterfaceDeclaration {
    pub fn file_name(&self) -> String {
        format!("{}.mo", self.name)
    }
}

/// Generate one record per data type, in model order.
pub fn generate_interfaces(
    model: &ArchitectureModel,
    options: &InterfaceOptions,
) -> Vec<InterfaceDeclaration> {
    let declarations: Vec<_> = model
        .data_types()
        .map(|(id, _)| {
            let name = model.interface_name(id);
            let text = render_record(model, id, &name, &options.package);
            InterfaceDeclaration {
                name,
                data_type: id,
                text,
            }
        })
        .collect();
    debug!(
        package = %options.package,
        records = declarations.len(),
        "generated interface records"
    );
    declarations
}

fn render_record(model: &ArchitectureModel, id: DataTypeId, name: &str, package: &str) -> String {
    let dt = model.data_type(id);
    let mut text = format!("within {package};\n");
    match &dt.doc {
        Some(doc) => text.push_str(&format!("record {name} {}\n", quote(doc))),
        None => text.push_str(&format!("record {name}\n")),
    }
    for field in &dt.fields {
        text.push_str("  ");
        text.push_str(&render_field(field));
        text.push('\n');
    }
    text.push_str(&format!("end {name};\n"));
    text
}

fn render_field(field: &Field) -> String {
    let scalar = field.kind.scalar();
    let mut line = match field.kind {
        FieldKind::Scalar(kind) => format!("{} {}", kind.modelica_name(), field.name),
        FieldKind::ArrayOf(kind, len) => format!("{} {}[{len}]", kind.modelica_name(), field.name),
    };
    if let Some(default) = &field.default {
        line.push_str(" = ");
        line.push_str(&render_default(default, field.kind, scalar));
    }
    if let Some(doc) = &field.doc {
        line.push(' ');
        line.push_str(&quote(doc));
    }
    line.push(';');
    line
}

fn render_default(default: &FieldDefault, kind: FieldKind, scalar: ScalarKind) -> String {
    match (default, kind) {
        (FieldDefault::Scalar(value), FieldKind::Scalar(_)) => literal(value, scalar),
        (FieldDefault::Scalar(value), FieldKind::ArrayOf(_, len)) => {
            format!("fill({}, {len})", literal(value, scalar))
        }
        (FieldDefault::PerIndex(values), _) => {
            let items: Vec<_> = values.iter().map(|v| literal(v, scalar)).collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

fn literal(value: &Value, kind: ScalarKind) -> String {
    match value {
        Value::String(s) => quote(s),
        other => other.render_as(kind),
    }
}

/// A Modelica string literal.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// The `package.mo` and `package.order` files for the interface package.
pub fn render_package(
    options: &InterfaceOptions,
    declarations: &[InterfaceDeclaration],
) -> (String, String) {
    let package_mo = format!(
        "within;\npackage {0}\n  \"Interface records generated from the architecture model\"\nend {0};\n",
        options.package
    );
    let mut package_order = String::new();
    for declaration in declarations {
        package_order.push_str(&declaration.name);
        package_order.push('\n');
    }
    (package_mo, package_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_core::{ModelBuilder, SourceLocation};

    fn compile(source: &str) -> ArchitectureModel {
        let tree = archweave_syntax::parse("arch.sysml", source).unwrap();
        archweave_resolve::Resolver::resolve(&[tree]).unwrap()
    }

    fn only(model: &ArchitectureModel) -> String {
        let decls = generate_interfaces(model, &InterfaceOptions::default());
        assert_eq!(decls.len(), 1);
        decls[0].text.clone()
    }

    #[test]
    fn vec3_record() {
        let model = compile("data def Vec3 { x, y, z }");
        assert_eq!(
            only(&model),
            "within GeneratedInterfaces;\nrecord Vec3\n  Real x;\n  Real y;\n  Real z;\nend Vec3;\n"
        );
    }

    #[test]
    fn kinds_arrays_and_defaults() {
        let model = compile(
            r#"
            data def Telemetry {
                doc /* Downlinked "health" frame */
                count : Integer = 3;
                valid : Boolean = true;
                label : String = "nav";
                samples : Real[10] = 0;
                gains : Real[2] = [1, 2.5];
            }
            "#,
        );
        let text = only(&model);
        assert!(text.contains("record Telemetry \"Downlinked \\\"health\\\" frame\"\n"));
        assert!(text.contains("  Integer count = 3;\n"));
        assert!(text.contains("  Boolean valid = true;\n"));
        assert!(text.contains("  String label = \"nav\";\n"));
        assert!(text.contains("  Real samples[10] = fill(0.0, 10);\n"));
        assert!(text.contains("  Real gains[2] = {1.0, 2.5};\n"));
    }

    #[test]
    fn field_order_follows_declaration() {
        let model = compile("data def Pose { z; a; m }");
        let text = only(&model);
        let z = text.find("Real z").unwrap();
        let a = text.find("Real a").unwrap();
        let m = text.find("Real m").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn generation_is_idempotent() {
        let source = "package Nav { data def Vec3 { x; y; z } data def Fix { lat; lon; ok : Boolean } }";
        let first = generate_interfaces(&compile(source), &InterfaceOptions::default());
        let second = generate_interfaces(&compile(source), &InterfaceOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn clashing_names_are_qualified() {
        let mut b = ModelBuilder::new();
        let nav = b.package_path(&["Nav"]);
        let ctl = b.package_path(&["Ctl"]);
        let loc = SourceLocation::synthetic();
        b.add_data_type(nav, "State", vec![Field::real("x")], None, loc.clone())
            .unwrap();
        b.add_data_type(ctl, "State", vec![Field::real("u")], None, loc)
            .unwrap();
        let model = b.build();
        let names: Vec<_> = generate_interfaces(&model, &InterfaceOptions::default())
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["Nav_State", "Ctl_State"]);
    }

    #[test]
    fn package_files() {
        let model = compile("data def A { x } data def B { y }");
        let options = InterfaceOptions {
            package: "Aircraft".into(),
        };
        let decls = generate_interfaces(&model, &options);
        assert!(decls[0].text.starts_with("within Aircraft;\n"));
        let (package_mo, order) = render_package(&options, &decls);
        assert!(package_mo.contains("package Aircraft\n"));
        assert!(package_mo.ends_with("end Aircraft;\n"));
        assert_eq!(order, "A\nB\n");
        assert_eq!(decls[1].file_name(), "B.mo");
    }
}
