//! Field kinds, literal values, and field defaults.
//!
//! Every data-type field and part attribute has a [`FieldKind`]: one of four
//! scalar kinds, or a fixed-length array of a scalar kind. Source type names
//! are mapped onto scalar kinds through a small, case-insensitive alias table
//! so that `float64`, `double` and `Real` all describe the same thing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::SourceLocation;

/// The four scalar kinds an interface field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Real,
    Integer,
    Boolean,
    String,
}

impl ScalarKind {
    /// Map a source type name onto a scalar kind.
    ///
    /// Only the last `::` segment is considered and the match ignores case,
    /// so `ScalarValues::Real`, `real` and `REAL` are all [`ScalarKind::Real`].
    pub fn from_type_name(name: &str) -> Option<Self> {
        let simple = name.rsplit("::").next().unwrap_or(name).trim();
        let lowered = simple.to_ascii_lowercase();
        match lowered.as_str() {
            "real" | "float" | "float32" | "float64" | "double" => Some(Self::Real),
            "integer" | "int" | "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16"
            | "uint32" | "uint64" => Some(Self::Integer),
            "boolean" | "bool" => Some(Self::Boolean),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// The Modelica spelling of this kind.
    pub fn modelica_name(self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::String => "String",
        }
    }

    /// Whether a literal value is acceptable for this kind.
    ///
    /// Integer literals are accepted where a Real is expected.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Real, Value::Real(_))
                | (Self::Real, Value::Integer(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Boolean, Value::Boolean(_))
                | (Self::String, Value::String(_))
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.modelica_name())
    }
}

/// The kind of a field: a scalar, or a fixed-length array of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Scalar(ScalarKind),
    ArrayOf(ScalarKind, usize),
}

impl FieldKind {
    pub const REAL: FieldKind = FieldKind::Scalar(ScalarKind::Real);
    pub const INTEGER: FieldKind = FieldKind::Scalar(ScalarKind::Integer);
    pub const BOOLEAN: FieldKind = FieldKind::Scalar(ScalarKind::Boolean);
    pub const STRING: FieldKind = FieldKind::Scalar(ScalarKind::String);

    pub fn scalar(self) -> ScalarKind {
        match self {
            Self::Scalar(kind) | Self::ArrayOf(kind, _) => kind,
        }
    }

    /// Array length, or `None` for scalars.
    pub fn length(self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::ArrayOf(_, len) => Some(len),
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::ArrayOf(..))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::ArrayOf(kind, len) => write!(f, "{kind}[{len}]"),
        }
    }
}

/// A literal value appearing in a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Real(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Render the value as it should appear for a field of `kind`.
    ///
    /// Integer literals stored in Real fields are widened, and Reals always
    /// carry a decimal point (`0.0`, not `0`).
    pub fn render_as(&self, kind: ScalarKind) -> String {
        match (kind, self) {
            (ScalarKind::Real, Value::Integer(i)) => format_real(*i as f64),
            _ => self.to_string(),
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Real(_) => "Real",
            Self::Integer(_) => "Integer",
            Self::Boolean(_) => "Boolean",
            Self::String(_) => "String",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(v) => f.write_str(&format_real(*v)),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

fn format_real(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Default value attached to a field.
///
/// For array fields a [`FieldDefault::Scalar`] is broadcast to every element,
/// while [`FieldDefault::PerIndex`] supplies one value per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldDefault {
    Scalar(Value),
    PerIndex(Vec<Value>),
}

impl FieldDefault {
    /// Default for the element at zero-based `index`.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::PerIndex(values) => values.get(index),
        }
    }

    /// Check the default against the field kind.
    ///
    /// Returns a description of the problem when the default is a list on a
    /// scalar field, has the wrong length, or contains a value of the wrong
    /// kind.
    pub fn check(&self, kind: FieldKind) -> Result<(), String> {
        let scalar = kind.scalar();
        match (self, kind) {
            (Self::PerIndex(_), FieldKind::Scalar(_)) => {
                Err(format!("list default given for scalar {kind} field"))
            }
            (Self::PerIndex(values), FieldKind::ArrayOf(_, len)) => {
                if values.len() != len {
                    return Err(format!(
                        "expected {len} default values for {kind}, found {}",
                        values.len()
                    ));
                }
                match values.iter().position(|v| !scalar.accepts(v)) {
                    Some(i) => Err(format!(
                        "default element {} is {}, expected {scalar}",
                        i + 1,
                        values[i].type_label()
                    )),
                    None => Ok(()),
                }
            }
            (Self::Scalar(value), _) if !scalar.accepts(value) => Err(format!(
                "default is {}, expected {scalar}",
                value.type_label()
            )),
            (Self::Scalar(_), _) => Ok(()),
        }
    }
}

/// A named, typed field of a data type, or an attribute of a part definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub default: Option<FieldDefault>,
    pub doc: Option<String>,
    pub location: SourceLocation,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            doc: None,
            location: SourceLocation::synthetic(),
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::REAL)
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_table_is_case_insensitive() {
        assert_eq!(ScalarKind::from_type_name("float64"), Some(ScalarKind::Real));
        assert_eq!(ScalarKind::from_type_name("Double"), Some(ScalarKind::Real));
        assert_eq!(ScalarKind::from_type_name("UINT8"), Some(ScalarKind::Integer));
        assert_eq!(ScalarKind::from_type_name("bool"), Some(ScalarKind::Boolean));
        assert_eq!(ScalarKind::from_type_name("String"), Some(ScalarKind::String));
        assert_eq!(ScalarKind::from_type_name("Vec3"), None);
    }

    #[test]
    fn alias_uses_last_path_segment() {
        assert_eq!(
            ScalarKind::from_type_name("ScalarValues::Real"),
            Some(ScalarKind::Real)
        );
        assert_eq!(ScalarKind::from_type_name("Real::Vec3"), None);
    }

    #[test]
    fn integers_accepted_for_real() {
        assert!(ScalarKind::Real.accepts(&Value::Integer(3)));
        assert!(!ScalarKind::Integer.accepts(&Value::Real(3.0)));
        assert!(!ScalarKind::Boolean.accepts(&Value::String("true".into())));
    }

    #[test]
    fn reals_render_with_decimal_point() {
        assert_eq!(Value::Real(0.0).to_string(), "0.0");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Integer(4).render_as(ScalarKind::Real), "4.0");
        assert_eq!(Value::Integer(4).render_as(ScalarKind::Integer), "4");
    }

    #[test]
    fn broadcast_default_covers_every_index() {
        let default = FieldDefault::Scalar(Value::Real(0.0));
        assert!(default.check(FieldKind::ArrayOf(ScalarKind::Real, 10)).is_ok());
        assert_eq!(default.value_at(9), Some(&Value::Real(0.0)));
    }

    #[test]
    fn per_index_length_must_match() {
        let default = FieldDefault::PerIndex(vec![Value::Real(1.0), Value::Real(2.0)]);
        assert!(default.check(FieldKind::ArrayOf(ScalarKind::Real, 2)).is_ok());
        let err = default
            .check(FieldKind::ArrayOf(ScalarKind::Real, 3))
            .unwrap_err();
        assert!(err.contains("expected 3"));
        assert_eq!(default.value_at(2), None);
    }

    #[test]
    fn list_default_rejected_on_scalar() {
        let default = FieldDefault::PerIndex(vec![Value::Real(1.0)]);
        assert!(default.check(FieldKind::REAL).is_err());
    }

    #[test]
    fn kind_mismatch_rejected() {
        let default = FieldDefault::Scalar(Value::String("fast".into()));
        assert!(default.check(FieldKind::INTEGER).is_err());
        let list = FieldDefault::PerIndex(vec![Value::Integer(1), Value::Boolean(true)]);
        let err = list
            .check(FieldKind::ArrayOf(ScalarKind::Integer, 2))
            .unwrap_err();
        assert!(err.contains("element 2"));
    }

    #[test]
    fn array_kind_display() {
        assert_eq!(FieldKind::ArrayOf(ScalarKind::Real, 10).to_string(), "Real[10]");
        assert_eq!(FieldKind::BOOLEAN.to_string(), "Boolean");
        assert_eq!(FieldKind::ArrayOf(ScalarKind::Integer, 4).length(), Some(4));
    }
}
