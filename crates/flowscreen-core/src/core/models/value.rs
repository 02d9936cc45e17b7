use serde::Deserialize;
use std::fmt;

/// A single value on a parameter axis.
///
/// Integers and floats are kept apart so that exported cells read the way they were
/// configured: `10` stages, but `2.0` for a whole-valued reflux ratio.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Returns the numeric value, widening integers to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Bool(_) | Scalar::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_integer_and_float_forms_apart() {
        assert_eq!(Scalar::Int(10).to_string(), "10");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Float(2.0).to_string(), "2.0");
        assert_eq!(Scalar::Float(-300.0).to_string(), "-300.0");
        assert_eq!(Scalar::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::from("Water").to_string(), "Water");
    }

    #[test]
    fn as_f64_widens_integers_and_rejects_text() {
        assert_eq!(Scalar::Int(300).as_f64(), Some(300.0));
        assert_eq!(Scalar::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Scalar::from("x").as_f64(), None);
        assert_eq!(Scalar::Bool(false).as_f64(), None);
    }

    #[test]
    fn deserializes_untagged_primitives() {
        use serde::de::IntoDeserializer;
        use serde::de::value::Error;

        let int = Scalar::deserialize(IntoDeserializer::<Error>::into_deserializer(300i64));
        let float = Scalar::deserialize(IntoDeserializer::<Error>::into_deserializer(1.5f64));
        let text = Scalar::deserialize(IntoDeserializer::<Error>::into_deserializer("PFR"));

        assert_eq!(int.unwrap(), Scalar::Int(300));
        assert_eq!(float.unwrap(), Scalar::Float(1.5));
        assert_eq!(text.unwrap(), Scalar::Text("PFR".to_string()));
    }
}
