//! SSV parameter sets.
//!
//! A parameter set lists the default of every parameter connector that has
//! one. The standalone set for a document names entries
//! `instance.attribute[i]`; the sets bound inline on each SSD component drop
//! the instance prefix.

use archweave_core::{ScalarKind, Value};

use crate::composition::{ComponentEntry, CompositionDocument, SSV_NS};
use crate::xml::XmlWriter;

const PARAMETER_SET_NAME: &str = "ArchitecturalDefaults";

/// A named list of typed parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub name: String,
    pub entries: Vec<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub name: String,
    pub kind: ScalarKind,
    pub value: Value,
}

/// Collect the defaults of every component in a document.
pub fn generate_parameter_set(document: &CompositionDocument) -> ParameterSet {
    let entries = document
        .components
        .iter()
        .flat_map(|component| values(component, Some(&component.name)))
        .collect();
    ParameterSet {
        name: PARAMETER_SET_NAME.to_string(),
        entries,
    }
}

fn values(component: &ComponentEntry, prefix: Option<&str>) -> Vec<ParameterValue> {
    component
        .parameters
        .iter()
        .filter_map(|p| {
            let value = p.default.clone()?;
            let name = match prefix {
                Some(instance) => format!("{instance}.{}", p.name),
                None => p.name.clone(),
            };
            Some(ParameterValue {
                name,
                kind: p.kind,
                value,
            })
        })
        .collect()
}

impl ParameterSet {
    /// The set bound inline on one component.
    pub(crate) fn for_component(component: &ComponentEntry) -> Self {
        Self {
            name: PARAMETER_SET_NAME.to_string(),
            entries: values(component, None),
        }
    }

    /// Render as a standalone `.ssv` document.
    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        write_set(&mut xml, self, true);
        xml.finish()
    }
}

/// Write the set as an element nested in an enclosing document that
/// already declares the `ssv` namespace.
pub(crate) fn write_parameter_set(xml: &mut XmlWriter, set: &ParameterSet) {
    write_set(xml, set, false);
}

fn write_set(xml: &mut XmlWriter, set: &ParameterSet, standalone: bool) {
    let mut attrs = vec![("name", set.name.as_str()), ("version", "1.0")];
    if standalone {
        attrs.insert(0, ("xmlns:ssv", SSV_NS));
    }
    xml.open("ssv:ParameterSet", &attrs);
    xml.open("ssv:Parameters", &[]);
    for entry in &set.entries {
        let value = match &entry.value {
            Value::String(s) => s.clone(),
            other => other.render_as(entry.kind),
        };
        xml.open("ssv:Parameter", &[("name", &entry.name)]);
        xml.empty(
            &format!("ssv:{}", entry.kind.modelica_name()),
            &[("value", &value)],
        );
        xml.close("ssv:Parameter");
    }
    xml.close("ssv:Parameters");
    xml.close("ssv:ParameterSet");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{generate_compositions, CompositionOptions};

    fn document(source: &str) -> CompositionDocument {
        let tree = archweave_syntax::parse("arch.sysml", source).unwrap();
        let model = archweave_resolve::Resolver::resolve(&[tree]).unwrap();
        generate_compositions(&model, &CompositionOptions::default()).remove(0)
    }

    #[test]
    fn entries_are_prefixed_with_the_instance() {
        let doc = document(
            r#"
            part def Planner {
                attribute waypointX_km : Real[10] = 0.0;
                attribute mode : Integer = 2;
                attribute armed : Boolean;
            }
            part planner : Planner;
            "#,
        );
        let set = generate_parameter_set(&doc);
        let names: Vec<_> = set.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "planner.mode");
        assert_eq!(names[1], "planner.waypointX_km[1]");
        assert_eq!(names[10], "planner.waypointX_km[10]");
        // Parameters without a default are not bound
        assert!(!names.iter().any(|n| n.contains("armed")));
        assert!(set.entries[1..].iter().all(|e| e.value == Value::Real(0.0)));
    }

    #[test]
    fn standalone_xml() {
        let doc = document(
            r#"
            part def Engine { attribute thrust = 1200; attribute label : String = "left"; }
            part engine : Engine;
            "#,
        );
        let xml = generate_parameter_set(&doc).to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ssv:ParameterSet xmlns:ssv="));
        assert!(xml.contains("name=\"ArchitecturalDefaults\" version=\"1.0\">"));
        assert!(xml.contains(
            "<ssv:Parameter name=\"engine.thrust\">\n      <ssv:Real value=\"1200.0\"/>"
        ));
        assert!(xml.contains("<ssv:String value=\"left\"/>"));
    }
}
