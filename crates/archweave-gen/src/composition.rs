//! SSP system structure generation.
//!
//! Every composition with at least one part usage becomes one
//! [`CompositionDocument`]: a component per part usage, a wiring entry per
//! connection, and the parameter connectors exposed by each component's
//! attributes. [`CompositionDocument::to_xml`] renders the document as an
//! SSD file with the attribute defaults bound inline.

use std::collections::HashMap;

use archweave_core::{
    ArchitectureModel, CompositionId, ConnectionId, Endpoint, Field, FieldKind, PartDefId,
    PartDefinition, PartUsageId, PortDirection, ScalarKind, Value,
};
use tracing::debug;

use crate::parameters::{write_parameter_set, ParameterSet};
use crate::xml::XmlWriter;

const SSD_NS: &str = "http://ssp-standard.org/SSP1/SystemStructureDescription";
const SSC_NS: &str = "http://ssp-standard.org/SSP1/SystemStructureCommon";
pub(crate) const SSV_NS: &str = "http://ssp-standard.org/SSP1/SystemStructureParameterValues";

const FMU_MIME_TYPE: &str = "application/x-fmu-sharedlibrary";

/// Options for composition generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionOptions {
    /// Directory, relative to the SSP root, that holds the component FMUs.
    pub resource_dir: String,
    /// Prefix of every FMU name (`<model_package>_<PartDef>.fmu`).
    pub model_package: Option<String>,
    /// Name of the system generated for the root package.
    pub system_name: String,
    pub start_time: f64,
    pub stop_time: f64,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            resource_dir: "resources".to_string(),
            model_package: None,
            system_name: "System".to_string(),
            start_time: 0.0,
            stop_time: 3600.0,
        }
    }
}

/// A generated system structure for one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionDocument {
    /// System name, also the stem of the output files.
    pub name: String,
    pub composition: CompositionId,
    pub components: Vec<ComponentEntry>,
    pub connections: Vec<WiringEntry>,
    pub start_time: f64,
    pub stop_time: f64,
}

/// One component placeholder, generated from a part usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEntry {
    pub name: String,
    pub usage: PartUsageId,
    pub definition: Option<PartDefId>,
    /// FMU path relative to the SSP root.
    pub source: String,
    pub connectors: Vec<SignalConnector>,
    pub parameters: Vec<ParameterConnector>,
}

impl ComponentEntry {
    fn connectors_of<'a>(&'a self, port: &'a str) -> impl Iterator<Item = &'a SignalConnector> {
        self.connectors.iter().filter(move |c| c.port == port)
    }
}

/// An input or output connector carrying one scalar of a port's data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalConnector {
    /// `port.field`, `port.field[i]`, or just `port` for a field-less type.
    pub name: String,
    pub port: String,
    /// The part of the name after `port.`; empty for a field-less type.
    pub suffix: String,
    pub direction: PortDirection,
    pub kind: ScalarKind,
}

/// A parameter connector for one scalar attribute or one array element.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterConnector {
    /// `name` for scalars, `name[i]` (one-based) for array elements.
    pub name: String,
    pub attribute: String,
    /// One-based element index for array attributes.
    pub index: Option<usize>,
    pub kind: ScalarKind,
    pub default: Option<Value>,
}

/// The wiring generated for one connection, oriented output to input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringEntry {
    pub connection: ConnectionId,
    pub start_element: String,
    pub start_port: String,
    pub end_element: String,
    pub end_port: String,
    /// Connector pairs `(start, end)`, one per suffix present on both ends.
    pub signals: Vec<(String, String)>,
}

/// Parameter connectors for one attribute.
///
/// A scalar attribute yields one connector. An array attribute of length N
/// yields N connectors `name[1]..name[N]`; element `i` takes the `i`th
/// per-index default, or the single default broadcast to every element.
/// Length zero yields nothing.
pub fn parameter_connectors(field: &Field) -> Vec<ParameterConnector> {
    let kind = field.kind.scalar();
    let default_at = |index: usize| {
        field
            .default
            .as_ref()
            .and_then(|d| d.value_at(index))
            .cloned()
    };
    match field.kind {
        FieldKind::Scalar(_) => vec![ParameterConnector {
            name: field.name.clone(),
            attribute: field.name.clone(),
            index: None,
            kind,
            default: default_at(0),
        }],
        FieldKind::ArrayOf(_, len) => (1..=len)
            .map(|i| ParameterConnector {
                name: format!("{}[{i}]", field.name),
                attribute: field.name.clone(),
                index: Some(i),
                kind,
                default: default_at(i - 1),
            })
            .collect(),
    }
}

/// Generate one document per composition that has part usages, in model
/// order.
pub fn generate_compositions(
    model: &ArchitectureModel,
    options: &CompositionOptions,
) -> Vec<CompositionDocument> {
    model
        .non_empty_compositions()
        .map(|(id, composition)| {
            let name = if composition.name == "<root>" {
                options.system_name.clone()
            } else {
                composition.name.replace("::", "_")
            };
            let components: Vec<_> = composition
                .usages
                .values()
                .map(|&usage| component(model, usage, options))
                .collect();
            let connections: Vec<_> = composition
                .connections
                .iter()
                .map(|&conn| wiring(model, conn, &components))
                .collect();
            debug!(
                system = %name,
                components = components.len(),
                connections = connections.len(),
                "generated composition"
            );
            CompositionDocument {
                name,
                composition: id,
                components,
                connections,
                start_time: options.start_time,
                stop_time: options.stop_time,
            }
        })
        .collect()
}

fn component(
    model: &ArchitectureModel,
    usage_id: PartUsageId,
    options: &CompositionOptions,
) -> ComponentEntry {
    let usage = model.part_usage(usage_id);
    let definition = usage.definition.target;
    let part = definition.map(|id| model.part_def(id));
    let def_name = part.map_or(usage.definition.name.as_str(), |p| p.name.as_str());
    let fmu = match &options.model_package {
        Some(prefix) => format!("{prefix}_{def_name}.fmu"),
        None => format!("{def_name}.fmu"),
    };
    let source = format!("{}/{fmu}", options.resource_dir.trim_end_matches('/'));

    let (connectors, parameters) = match part {
        Some(part) => (signal_connectors(model, part), sorted_parameters(part)),
        None => (Vec::new(), Vec::new()),
    };
    ComponentEntry {
        name: usage.name.clone(),
        usage: usage_id,
        definition,
        source,
        connectors,
        parameters,
    }
}

fn signal_connectors(model: &ArchitectureModel, part: &PartDefinition) -> Vec<SignalConnector> {
    let mut connectors = Vec::new();
    for port in &part.ports {
        let Some(type_id) = port.port_type.target else {
            continue;
        };
        let fields = &model.data_type(type_id).fields;
        let mut push = |suffix: String, kind: ScalarKind| {
            let name = if suffix.is_empty() {
                port.name.clone()
            } else {
                format!("{}.{suffix}", port.name)
            };
            connectors.push(SignalConnector {
                name,
                port: port.name.clone(),
                suffix,
                direction: port.direction,
                kind,
            });
        };
        if fields.is_empty() {
            push(String::new(), ScalarKind::Real);
        }
        for field in fields {
            match field.kind {
                FieldKind::Scalar(kind) => push(field.name.clone(), kind),
                FieldKind::ArrayOf(kind, len) => {
                    for i in 1..=len {
                        push(format!("{}[{i}]", field.name), kind);
                    }
                }
            }
        }
    }
    connectors
}

fn sorted_parameters(part: &PartDefinition) -> Vec<ParameterConnector> {
    let mut attributes: Vec<&Field> = part.attributes.iter().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    attributes
        .into_iter()
        .flat_map(parameter_connectors)
        .collect()
}

fn wiring(
    model: &ArchitectureModel,
    connection_id: ConnectionId,
    components: &[ComponentEntry],
) -> WiringEntry {
    let conn = model.connection(connection_id);
    let direction = |side: &Endpoint| side.target.map(|t| model.port(t).direction);
    let (start, end) = match (direction(&conn.from), direction(&conn.to)) {
        (Some(PortDirection::In), Some(PortDirection::Out)) => (&conn.to, &conn.from),
        _ => (&conn.from, &conn.to),
    };

    let by_name: HashMap<&str, &ComponentEntry> =
        components.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut signals = Vec::new();
    if let (Some(start_comp), Some(end_comp)) = (
        by_name.get(start.usage.as_str()),
        by_name.get(end.usage.as_str()),
    ) {
        for from in start_comp.connectors_of(&start.port) {
            if let Some(to) = end_comp
                .connectors_of(&end.port)
                .find(|c| c.suffix == from.suffix)
            {
                signals.push((from.name.clone(), to.name.clone()));
            }
        }
    }

    WiringEntry {
        connection: connection_id,
        start_element: start.usage.clone(),
        start_port: start.port.clone(),
        end_element: end.usage.clone(),
        end_port: end.port.clone(),
        signals,
    }
}

impl CompositionDocument {
    pub fn file_name(&self) -> String {
        format!("{}.ssd", self.name)
    }

    /// Render the document as SSD XML.
    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.open(
            "ssd:SystemStructureDescription",
            &[
                ("xmlns:ssd", SSD_NS),
                ("xmlns:ssc", SSC_NS),
                ("xmlns:ssv", SSV_NS),
                ("name", &self.name),
                ("version", "1.0"),
            ],
        );
        xml.open("ssd:System", &[("name", &self.name)]);

        xml.open("ssd:Elements", &[]);
        for component in &self.components {
            write_component(&mut xml, component);
        }
        xml.close("ssd:Elements");

        let signals: Vec<_> = self
            .connections
            .iter()
            .flat_map(|w| w.signals.iter().map(move |s| (w, s)))
            .collect();
        if !signals.is_empty() {
            xml.open("ssd:Connections", &[]);
            for (wire, (start, end)) in signals {
                xml.empty(
                    "ssd:Connection",
                    &[
                        ("startElement", &wire.start_element),
                        ("startConnector", start),
                        ("endElement", &wire.end_element),
                        ("endConnector", end),
                    ],
                );
            }
            xml.close("ssd:Connections");
        }
        xml.close("ssd:System");

        let start = self.start_time.to_string();
        let stop = self.stop_time.to_string();
        xml.empty(
            "ssd:DefaultExperiment",
            &[("startTime", &start), ("stopTime", &stop)],
        );
        xml.close("ssd:SystemStructureDescription");
        xml.finish()
    }
}

fn write_component(xml: &mut XmlWriter, component: &ComponentEntry) {
    xml.open(
        "ssd:Component",
        &[
            ("name", &component.name),
            ("type", FMU_MIME_TYPE),
            ("source", &component.source),
        ],
    );
    if !component.connectors.is_empty() || !component.parameters.is_empty() {
        xml.open("ssd:Connectors", &[]);
        for connector in &component.connectors {
            write_connector(xml, &connector.name, connector.direction.causality(), connector.kind);
        }
        for parameter in &component.parameters {
            write_connector(xml, &parameter.name, "parameter", parameter.kind);
        }
        xml.close("ssd:Connectors");
    }

    let bound = ParameterSet::for_component(component);
    if !bound.entries.is_empty() {
        xml.open("ssd:ParameterBindings", &[]);
        xml.open("ssd:ParameterBinding", &[]);
        xml.open("ssd:ParameterValues", &[]);
        write_parameter_set(xml, &bound);
        xml.close("ssd:ParameterValues");
        xml.close("ssd:ParameterBinding");
        xml.close("ssd:ParameterBindings");
    }
    xml.close("ssd:Component");
}

fn write_connector(xml: &mut XmlWriter, name: &str, kind: &str, scalar: ScalarKind) {
    xml.open("ssd:Connector", &[("name", name), ("kind", kind)]);
    xml.empty(&format!("ssc:{}", scalar.modelica_name()), &[]);
    xml.close("ssd:Connector");
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_core::FieldDefault;

    fn compile(source: &str) -> ArchitectureModel {
        let tree = archweave_syntax::parse("arch.sysml", source).unwrap();
        archweave_resolve::Resolver::resolve(&[tree]).unwrap()
    }

    fn documents(source: &str) -> Vec<CompositionDocument> {
        generate_compositions(&compile(source), &CompositionOptions::default())
    }

    const NAV: &str = r#"
        data def Vec3 { x; y; z }
        data def Track { heading; ids : Integer[2] }
        part def Sensor {
            attribute gain = 2.5;
            attribute waypointX_km : Real[10] = 0.0;
            attribute bias : Real[3] = [0.1, 0.2, 0.3];
            attribute spare : Real[0];
            out reading : Vec3;
            out track : Track;
        }
        part def Logger {
            in value : Vec3;
            in track : Track;
        }
        part sensor : Sensor;
        part logger : Logger;
        connect logger.value to sensor.reading;
        connect sensor.track to logger.track;
    "#;

    #[test]
    fn broadcast_array_default_expands_per_index() {
        let docs = documents(NAV);
        let sensor = &docs[0].components[0];
        let waypoints: Vec<_> = sensor
            .parameters
            .iter()
            .filter(|p| p.attribute == "waypointX_km")
            .collect();
        assert_eq!(waypoints.len(), 10);
        for (i, p) in waypoints.iter().enumerate() {
            assert_eq!(p.name, format!("waypointX_km[{}]", i + 1));
            assert_eq!(p.index, Some(i + 1));
            assert_eq!(p.default, Some(Value::Real(0.0)));
        }
    }

    #[test]
    fn per_index_defaults_and_empty_arrays() {
        let docs = documents(NAV);
        let params = &docs[0].components[0].parameters;
        let bias: Vec<_> = params
            .iter()
            .filter(|p| p.attribute == "bias")
            .map(|p| (p.name.as_str(), p.default.clone()))
            .collect();
        assert_eq!(
            bias,
            [
                ("bias[1]", Some(Value::Real(0.1))),
                ("bias[2]", Some(Value::Real(0.2))),
                ("bias[3]", Some(Value::Real(0.3))),
            ]
        );
        assert!(params.iter().all(|p| p.attribute != "spare"));
    }

    #[test]
    fn parameters_sorted_by_attribute_name() {
        let docs = documents(NAV);
        let order: Vec<_> = docs[0].components[0]
            .parameters
            .iter()
            .map(|p| p.attribute.as_str())
            .collect();
        let mut dedup = order.clone();
        dedup.dedup();
        assert_eq!(dedup, ["bias", "gain", "waypointX_km"]);
    }

    #[test]
    fn parameter_connectors_for_field() {
        let scalar = Field::real("gain").with_default(FieldDefault::Scalar(Value::Integer(2)));
        let conns = parameter_connectors(&scalar);
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].name, "gain");
        assert_eq!(conns[0].index, None);

        let empty = Field::new("spare", FieldKind::ArrayOf(ScalarKind::Real, 0));
        assert!(parameter_connectors(&empty).is_empty());

        let undefaulted = Field::new("limits", FieldKind::ArrayOf(ScalarKind::Integer, 2));
        let conns = parameter_connectors(&undefaulted);
        assert_eq!(conns.len(), 2);
        assert!(conns.iter().all(|c| c.default.is_none()));
    }

    #[test]
    fn signal_connectors_expand_fields() {
        let docs = documents(NAV);
        let names: Vec<_> = docs[0].components[0]
            .connectors
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "reading.x",
                "reading.y",
                "reading.z",
                "track.heading",
                "track.ids[1]",
                "track.ids[2]",
            ]
        );
        assert_eq!(docs[0].components[0].source, "resources/Sensor.fmu");
    }

    #[test]
    fn wiring_is_oriented_output_to_input() {
        let docs = documents(NAV);
        let wires = &docs[0].connections;
        assert_eq!(wires.len(), 2);
        assert_eq!(wires[0].start_element, "sensor");
        assert_eq!(wires[0].end_element, "logger");
        assert_eq!(
            wires[0].signals,
            [
                ("reading.x".to_string(), "value.x".to_string()),
                ("reading.y".to_string(), "value.y".to_string()),
                ("reading.z".to_string(), "value.z".to_string()),
            ]
        );
        assert_eq!(wires[1].signals.len(), 3);
    }

    #[test]
    fn fieldless_types_use_the_port_name() {
        let docs = documents(
            r#"
            port def Pulse { }
            part def A { out tick : Pulse; }
            part def B { in tick : Pulse; }
            part a : A;
            part b : B;
            connect a.tick to b.tick;
            "#,
        );
        let wires = &docs[0].connections;
        assert_eq!(wires[0].signals, [("tick".to_string(), "tick".to_string())]);
    }

    #[test]
    fn one_document_per_non_empty_composition() {
        let docs = documents(
            r#"
            part def Engine { }
            part def Aircraft {
                part left : Engine;
                part right : Engine;
            }
            package Fleet { part lead : Aircraft; }
            "#,
        );
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Aircraft", "Fleet"]);
        assert_eq!(docs[0].components.len(), 2);
    }

    #[test]
    fn model_package_prefix_and_root_name() {
        let model = compile("part def Engine { } part main : Engine;");
        let options = CompositionOptions {
            resource_dir: "fmus/".into(),
            model_package: Some("Aircraft".into()),
            system_name: "Demo".into(),
            ..CompositionOptions::default()
        };
        let docs = generate_compositions(&model, &options);
        assert_eq!(docs[0].name, "Demo");
        assert_eq!(docs[0].components[0].source, "fmus/Aircraft_Engine.fmu");
    }

    #[test]
    fn ssd_xml() {
        let xml = documents(NAV)[0].to_xml();
        assert!(xml.contains("<ssd:SystemStructureDescription xmlns:ssd="));
        assert!(xml.contains(
            "<ssd:Component name=\"sensor\" type=\"application/x-fmu-sharedlibrary\" source=\"resources/Sensor.fmu\">"
        ));
        assert!(xml.contains("<ssd:Connector name=\"reading.x\" kind=\"output\">"));
        assert!(xml.contains("<ssd:Connector name=\"value.x\" kind=\"input\">"));
        assert!(xml.contains("<ssd:Connector name=\"track.ids[1]\" kind=\"output\">\n            <ssc:Integer/>"));
        assert!(xml.contains("<ssd:Connector name=\"waypointX_km[10]\" kind=\"parameter\">"));
        assert!(xml.contains(
            "<ssd:Connection startElement=\"sensor\" startConnector=\"reading.x\" endElement=\"logger\" endConnector=\"value.x\"/>"
        ));
        assert!(xml.contains("<ssv:Parameter name=\"waypointX_km[3]\">"));
        assert!(xml.contains("<ssv:Real value=\"0.0\"/>"));
        assert!(xml.contains("<ssd:DefaultExperiment startTime=\"0\" stopTime=\"3600\"/>"));
        assert_eq!(xml.matches("<ssd:Connection ").count(), 6);
    }

    #[test]
    fn rendering_is_deterministic() {
        let a: Vec<_> = documents(NAV).iter().map(CompositionDocument::to_xml).collect();
        let b: Vec<_> = documents(NAV).iter().map(CompositionDocument::to_xml).collect();
        assert_eq!(a, b);
    }
}
