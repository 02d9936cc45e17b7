use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Invalid {expected} value for {key}: '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Axis '{0}' needs at least one value")]
    EmptyList(String),
}

/// Splits `KEY=VALUE` at the first `=`. Both sides are trimmed; the key must not be empty.
pub fn parse_assignment(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(pair.to_string())),
    }
}

pub fn parse_value<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Parses a comma-separated list such as `300,325.5, 350`.
pub fn parse_list<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<Vec<T>, ParseError> {
    let items: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ParseError::EmptyList(key.to_string()));
    }
    items
        .into_iter()
        .map(|item| parse_value(key, item, expected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_at_first_equals() {
        assert_eq!(
            parse_assignment("output.path=a=b.csv").unwrap(),
            ("output.path", "a=b.csv")
        );
        assert_eq!(
            parse_assignment(" reactor.enabled = false ").unwrap(),
            ("reactor.enabled", "false")
        );
    }

    #[test]
    fn assignment_without_key_or_equals_is_rejected() {
        assert_eq!(
            parse_assignment("reactor.enabled"),
            Err(ParseError::InvalidAssignment("reactor.enabled".to_string()))
        );
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn lists_are_trimmed_and_typed() {
        let values: Vec<f64> = parse_list("reactor.volumes", "1, 2.5,3", "float").unwrap();
        assert_eq!(values, vec![1.0, 2.5, 3.0]);
        let stages: Vec<i64> = parse_list("distillation.stages", "10,15", "integer").unwrap();
        assert_eq!(stages, vec![10, 15]);
    }

    #[test]
    fn bad_list_items_name_the_key() {
        let err = parse_list::<i64>("distillation.stages", "10,x", "integer").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                key: "distillation.stages".to_string(),
                value: "x".to_string(),
                expected: "integer",
            }
        );
        assert_eq!(
            parse_list::<f64>("reactor.volumes", " , ", "float"),
            Err(ParseError::EmptyList("reactor.volumes".to_string()))
        );
    }
}
