//! Connection verification.
//!
//! Resolution only binds names; whether a connection makes sense is decided
//! here. Endpoints are looked up again by name in the owning composition, so
//! a model whose bindings are incomplete is still checked as far as possible.

use std::collections::HashMap;

use archweave_core::{
    ArchitectureModel, Composition, Connection, Endpoint, PartUsageId, Port, PortDirection,
};
use tracing::debug;

use crate::report::{ModelLocation, Outcome, Violation, ViolationKind};

/// Checks that every connection joins two existing ports of the same data
/// type and opposite direction, and that no input is driven twice.
pub struct ConnectionVerifier;

impl ConnectionVerifier {
    pub fn verify(model: &ArchitectureModel) -> Outcome {
        let mut violations = Vec::new();
        // Driven inputs, keyed by (usage, port name), in connection order
        let mut drivers: HashMap<(PartUsageId, &str), usize> = HashMap::new();

        for (_, conn) in model.connections() {
            let composition = model.composition(conn.composition);
            let from = endpoint(model, composition, &conn.from);
            let to = endpoint(model, composition, &conn.to);

            for (side, found) in [(&conn.from, &from), (&conn.to, &to)] {
                if let Err(reason) = found {
                    violations.push(Violation::new(
                        ViolationKind::UnknownEndpoint,
                        format!("cannot connect `{side}`: {reason}"),
                        location(side, conn),
                    ));
                }
            }
            let (Ok((from_usage, from_port)), Ok((to_usage, to_port))) = (from, to) else {
                continue;
            };

            if !same_type(from_port, to_port) {
                violations.push(Violation::new(
                    ViolationKind::TypeMismatch,
                    format!(
                        "`{}` carries {} but `{}` expects {}",
                        conn.from,
                        from_port.port_type.name,
                        conn.to,
                        to_port.port_type.name
                    ),
                    location(&conn.from, conn),
                ));
            }

            let target = match (from_port.direction, to_port.direction) {
                (PortDirection::Out, PortDirection::In) => (to_usage, to_port),
                (PortDirection::In, PortDirection::Out) => (from_usage, from_port),
                (a, b) => {
                    violations.push(Violation::new(
                        ViolationKind::DirectionMismatch,
                        format!(
                            "`{}` ({a}) and `{}` ({b}) must be one `out` and one `in` port",
                            conn.from, conn.to
                        ),
                        location(&conn.from, conn),
                    ));
                    continue;
                }
            };

            let count = drivers.entry((target.0, target.1.name.as_str())).or_insert(0);
            *count += 1;
            if *count > 1 {
                let input = if target.0 == to_usage { &conn.to } else { &conn.from };
                violations.push(Violation::new(
                    ViolationKind::FanInConflict,
                    format!("input `{input}` is already driven by another connection"),
                    location(input, conn),
                ));
            }
        }

        debug!(violations = violations.len(), "connection check complete");
        Outcome::from_violations(violations)
    }
}

/// Find the usage and port an endpoint names within its composition.
fn endpoint<'m>(
    model: &'m ArchitectureModel,
    composition: &Composition,
    endpoint: &Endpoint,
) -> Result<(PartUsageId, &'m Port), String> {
    let usage_id = *composition
        .usages
        .get(&endpoint.usage)
        .ok_or_else(|| format!("no part `{}` in {}", endpoint.usage, composition.name))?;
    let usage = model.part_usage(usage_id);
    let def_id = usage
        .definition
        .target
        .ok_or_else(|| format!("part definition `{}` is unresolved", usage.definition.name))?;
    let def = model.part_def(def_id);
    def.port(&endpoint.port)
        .map(|(_, port)| (usage_id, port))
        .ok_or_else(|| format!("`{}` has no port `{}`", def.name, endpoint.port))
}

fn same_type(a: &Port, b: &Port) -> bool {
    match (a.port_type.target, b.port_type.target) {
        (Some(x), Some(y)) => x == y,
        _ => a.port_type.name == b.port_type.name,
    }
}

fn location(endpoint: &Endpoint, conn: &Connection) -> ModelLocation {
    ModelLocation::new(endpoint.to_string(), Some(conn.location.clone()))
}
