use super::value::Scalar;
use serde::Deserialize;
use std::fmt;

/// Property names understood by the bundled engine and used by the orchestrator's
/// wiring templates and metric extraction.
pub mod names {
    pub const TEMPERATURE: &str = "Temperature";
    pub const PRESSURE: &str = "Pressure";
    pub const MASS_FLOW: &str = "MassFlow";
    pub const MOLAR_FLOW: &str = "Molar Flow";
    pub const COMPOSITION: &str = "OverallMolarComposition";
    pub const ENERGY_FLOW: &str = "Energy Flow";

    pub const VOLUME: &str = "Volume";
    pub const OPERATION_MODE: &str = "ReactorOperationMode";

    pub const REFLUX_RATIO: &str = "Reflux Ratio";
    pub const NUMBER_OF_STAGES: &str = "Number of Stages";
    pub const CONDENSER_PRESSURE: &str = "Condenser Pressure";
    pub const REBOILER_PRESSURE: &str = "Reboiler Pressure";
    pub const LIGHT_KEY: &str = "Light Key";
    pub const HEAVY_KEY: &str = "Heavy Key";
    pub const LIGHT_KEY_FRACTION: &str = "Light Key Mole Fraction";
    pub const CONDENSER_DUTY: &str = "Condenser Duty";
    pub const REBOILER_DUTY: &str = "Reboiler Duty";

    /// Reaction-set binding surfaces. Engines disagree on which of these a reactor
    /// exposes; the indexed forms take the set's position in the context's set list.
    pub const REACTION_SET_INDEX: &str = "Reaction Set";
    pub const REACTION_SET_INDEX_COMPACT: &str = "ReactionSet";
    pub const REACTION_SET_ID: &str = "ReactionSetID";
    pub const REACTION_SET_ATTRIBUTE: &str = "ReactionSet";
}

/// A value written to, or read from, a simulation object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Number(f64),
    Flag(bool),
    Text(String),
    Vector(Vec<f64>),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(*v),
            PropertyValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Number(_) => "number",
            PropertyValue::Flag(_) => "flag",
            PropertyValue::Text(_) => "text",
            PropertyValue::Vector(_) => "vector",
        }
    }

    /// Compares two values the way an engine read-back should be judged: numbers by
    /// value regardless of integer/float representation, everything else exactly.
    pub fn same_as(&self, other: &PropertyValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(v) => write!(f, "{}", v),
            PropertyValue::Number(v) => write!(f, "{}", v),
            PropertyValue::Flag(v) => write!(f, "{}", v),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Vector(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&Scalar> for PropertyValue {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Int(v) => PropertyValue::Integer(*v),
            Scalar::Float(v) => PropertyValue::Number(*v),
            Scalar::Bool(v) => PropertyValue::Flag(*v),
            Scalar::Text(s) => PropertyValue::Text(s.clone()),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        PropertyValue::Vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_as_ignores_numeric_representation() {
        assert!(PropertyValue::Integer(2).same_as(&PropertyValue::Number(2.0)));
        assert!(!PropertyValue::Integer(2).same_as(&PropertyValue::Number(2.5)));
        assert!(PropertyValue::from("RS-1").same_as(&PropertyValue::from("RS-1")));
        assert!(!PropertyValue::from("RS-1").same_as(&PropertyValue::Integer(1)));
    }

    #[test]
    fn scalars_convert_to_matching_property_values() {
        assert_eq!(
            PropertyValue::from(&Scalar::Int(10)),
            PropertyValue::Integer(10)
        );
        assert_eq!(
            PropertyValue::from(&Scalar::Float(1.5)),
            PropertyValue::Number(1.5)
        );
    }

    #[test]
    fn vector_display_is_bracketed() {
        assert_eq!(PropertyValue::from(vec![1.0, 0.5]).to_string(), "[1, 0.5]");
    }
}
