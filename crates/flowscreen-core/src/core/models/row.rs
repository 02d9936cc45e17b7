use super::parameters::ParameterSet;
use jiff::Timestamp;

/// The single record produced for every attempted case.
///
/// Rows are immutable once built; the aggregator only ever appends them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    case_type: String,
    parameters: ParameterSet,
    metrics: Vec<(String, f64)>,
    success: bool,
    error: String,
    timestamp: Timestamp,
}

impl ResultRow {
    pub fn new(
        case_type: impl Into<String>,
        parameters: ParameterSet,
        metrics: Vec<(String, f64)>,
        success: bool,
        error: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(case_type, parameters, metrics, success, error, Timestamp::now())
    }

    pub fn with_timestamp(
        case_type: impl Into<String>,
        parameters: ParameterSet,
        metrics: Vec<(String, f64)>,
        success: bool,
        error: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            case_type: case_type.into(),
            parameters,
            metrics,
            success,
            error: error.into(),
            timestamp,
        }
    }

    pub fn case_type(&self) -> &str {
        &self.case_type
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn metrics(&self) -> &[(String, f64)] {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Parameter names followed by metric names, in the order they were recorded.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .names()
            .chain(self.metrics.iter().map(|(n, _)| n.as_str()))
    }

    /// Renders the cell for `key`; parameters take precedence over metrics of the same
    /// name.
    pub fn cell(&self, key: &str) -> Option<String> {
        self.parameters
            .get(key)
            .map(ToString::to_string)
            .or_else(|| self.metric(key).map(|v| v.to_string()))
    }
}
