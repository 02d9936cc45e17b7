use super::config::ConfigError;
use super::state::CaseStage;
use crate::adapter::error::EngineError;
use crate::core::io::report::ExportError;
use thiserror::Error;

/// Errors that stop a screening run. Everything that goes wrong inside a single case
/// is recorded in that case's result row instead.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("Simulation engine unavailable: {0}")]
    EngineUnavailable(#[source] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to export results: {0}")]
    Export(#[from] ExportError),
}

/// An engine failure that ended a case early, tagged with the stage it happened in.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{stage} failed: {source}")]
pub struct CaseError {
    pub stage: CaseStage,
    #[source]
    pub source: EngineError,
}

impl CaseError {
    pub fn new(stage: CaseStage, source: EngineError) -> Self {
        Self { stage, source }
    }
}
