//! FMI terminal definitions.
//!
//! Every typed port of a part definition becomes one terminal grouping the
//! scalar variables its data type contributes, so a port can be plugged as a
//! whole. Variable names match the signal connectors of the generated system
//! structure (`port.field`, `port.field[i]`, or `port`).

use archweave_core::{ArchitectureModel, FieldKind};
use tracing::debug;

use crate::xml::XmlWriter;

/// File name of the terminals document below the output directory.
pub const TERMINALS_FILE: &str = "terminalsAndIcons.xml";

const FMI_VERSION: &str = "3.0";

/// Terminals of every part definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalsDocument {
    pub terminals: Vec<Terminal>,
}

/// One port as a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    /// `<PartDef>_<port>`, with `::` in the part path replaced by `_`.
    pub name: String,
    /// Interface name of the port's data type.
    pub kind: String,
    pub description: Option<String>,
    pub members: Vec<TerminalMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalMember {
    /// Field name within the interface, `field[i]` for array elements.
    pub member_name: String,
    pub variable_name: String,
    pub description: Option<String>,
}

/// Collect terminals for every part definition, ordered by qualified part
/// name and then port declaration order. Ports whose type did not resolve
/// are left out.
pub fn generate_terminals(model: &ArchitectureModel) -> TerminalsDocument {
    let mut parts: Vec<_> = model
        .part_defs()
        .map(|(_, def)| (model.qualified_name(def.package, &def.name), def))
        .collect();
    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut terminals = Vec::new();
    for (qualified, def) in parts {
        let prefix = qualified.replace("::", "_");
        for port in &def.ports {
            let Some(type_id) = port.port_type.target else {
                continue;
            };
            let data_type = model.data_type(type_id);
            let mut members = Vec::new();
            if data_type.fields.is_empty() {
                members.push(TerminalMember {
                    member_name: port.name.clone(),
                    variable_name: port.name.clone(),
                    description: port.doc.clone(),
                });
            }
            for field in &data_type.fields {
                let mut push = |member_name: String| {
                    members.push(TerminalMember {
                        variable_name: format!("{}.{member_name}", port.name),
                        member_name,
                        description: field.doc.clone(),
                    });
                };
                match field.kind {
                    FieldKind::Scalar(_) => push(field.name.clone()),
                    FieldKind::ArrayOf(_, len) => {
                        for i in 1..=len {
                            push(format!("{}[{i}]", field.name));
                        }
                    }
                }
            }
            terminals.push(Terminal {
                name: format!("{prefix}_{}", port.name),
                kind: model.interface_name(type_id),
                description: port.doc.clone(),
                members,
            });
        }
    }
    debug!(terminals = terminals.len(), "generated terminals");
    TerminalsDocument { terminals }
}

impl TerminalsDocument {
    /// Render as an `fmiTerminalsAndIcons` document.
    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.open("fmiTerminalsAndIcons", &[("fmiVersion", FMI_VERSION)]);
        xml.open("Terminals", &[]);
        for terminal in &self.terminals {
            let mut attrs = vec![
                ("name", terminal.name.as_str()),
                ("matchingRule", "plug"),
                ("terminalKind", terminal.kind.as_str()),
            ];
            if let Some(description) = &terminal.description {
                attrs.push(("description", description.as_str()));
            }
            xml.open("Terminal", &attrs);
            for member in &terminal.members {
                let mut attrs = vec![
                    ("variableKind", "signal"),
                    ("variableName", member.variable_name.as_str()),
                    ("memberName", member.member_name.as_str()),
                ];
                if let Some(description) = &member.description {
                    attrs.push(("description", description.as_str()));
                }
                xml.empty("TerminalMemberVariable", &attrs);
            }
            xml.close("Terminal");
        }
        xml.close("Terminals");
        xml.close("fmiTerminalsAndIcons");
        xml.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> ArchitectureModel {
        let tree = archweave_syntax::parse("arch.sysml", source).unwrap();
        archweave_resolve::Resolver::resolve(&[tree]).unwrap()
    }

    const ARCH: &str = r#"
        package Nav {
            data def Fix {
                doc /* Position fix */
                lat;
                lon;
                samples : Real[2];
            }
            data def Trigger { }
        }
        part def Gps {
            doc /* Receiver */
            out fix : Nav::Fix;
            in sync : Nav::Trigger;
        }
        package Flight {
            part def Autopilot { in fix : Nav::Fix; }
        }
    "#;

    #[test]
    fn one_terminal_per_port() {
        let document = generate_terminals(&compile(ARCH));
        let names: Vec<_> = document.terminals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Flight_Autopilot_fix", "Gps_fix", "Gps_sync"]);

        let fix = &document.terminals[1];
        assert_eq!(fix.kind, "Fix");
        let variables: Vec<_> = fix.members.iter().map(|m| m.variable_name.as_str()).collect();
        assert_eq!(
            variables,
            ["fix.lat", "fix.lon", "fix.samples[1]", "fix.samples[2]"]
        );
        assert_eq!(fix.members[2].member_name, "samples[1]");
    }

    #[test]
    fn fieldless_type_is_a_single_member() {
        let document = generate_terminals(&compile(ARCH));
        let sync = &document.terminals[2];
        assert_eq!(sync.members.len(), 1);
        assert_eq!(sync.members[0].variable_name, "sync");
        assert_eq!(sync.members[0].member_name, "sync");
    }

    #[test]
    fn renders_fmi_terminals() {
        let xml = generate_terminals(&compile(
            "data def Vec3 { x; y; z }\npart def Imu {\n  doc /* Rates & angles */\n  out rate : Vec3;\n}\n",
        ))
        .to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("<fmiTerminalsAndIcons fmiVersion=\"3.0\">\n  <Terminals>\n"));
        assert!(xml.contains(
            r#"    <Terminal name="Imu_rate" matchingRule="plug" terminalKind="Vec3">"#
        ));
        assert!(xml.contains(
            r#"      <TerminalMemberVariable variableKind="signal" variableName="rate.z" memberName="z"/>"#
        ));
        assert!(xml.ends_with("    </Terminal>\n  </Terminals>\n</fmiTerminalsAndIcons>\n"));
    }

    #[test]
    fn empty_model_has_no_terminals() {
        let xml = generate_terminals(&compile("")).to_xml();
        assert!(xml.contains("<Terminals>\n  </Terminals>"));
    }
}
