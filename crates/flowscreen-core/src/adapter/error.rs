use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Simulation engine '{backend}' is unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Simulation context does not exist (it may have been released)")]
    ContextNotFound,

    #[error("Unit '{tag}' does not exist in this context")]
    UnitNotFound { tag: String },

    #[error("Property '{property}' is not exposed by unit '{unit}'")]
    PropertyNotFound { unit: String, property: String },

    #[error("Property '{property}' on unit '{unit}' has no value yet")]
    PropertyUnset { unit: String, property: String },

    #[error("Invalid value for '{property}' on unit '{unit}': expected {expected}, got {found}")]
    InvalidValue {
        unit: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{kind} '{name}' is already defined")]
    DuplicateDefinition { kind: &'static str, name: String },

    #[error("Unknown compound '{0}'")]
    UnknownCompound(String),

    #[error("Reaction set '{0}' not found")]
    ReactionSetNotFound(String),

    #[error("Cannot connect '{from}' to '{to}': {reason}")]
    Connection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Engine call '{call}' failed: {message}")]
    CallFailed { call: &'static str, message: String },
}

impl EngineError {
    /// Warnings the orchestrator tolerates without marking a case as failed.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EngineError::DuplicateDefinition { .. })
    }
}
