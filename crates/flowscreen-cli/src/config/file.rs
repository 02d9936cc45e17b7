use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The screening configuration as written in a TOML file. Every field is optional;
/// anything left out falls back to the built-in defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub engine: Option<FileEngineConfig>,
    pub output: Option<FileOutputConfig>,
    pub reactor: Option<FileReactorConfig>,
    pub distillation: Option<FileDistillationConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEngineConfig {
    pub backend: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileFeedConfig {
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub mass_flow: Option<f64>,
    pub composition: Option<Vec<f64>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileKineticsConfig {
    pub order: Option<f64>,
    pub pre_exponential_factor: Option<f64>,
    pub activation_energy: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileReactorConfig {
    pub enabled: Option<bool>,
    pub case_type: Option<String>,
    pub reactant: Option<String>,
    pub product: Option<String>,
    pub temperatures: Option<Vec<f64>>,
    pub volumes: Option<Vec<f64>>,
    pub operation_mode: Option<i64>,
    pub feed: Option<FileFeedConfig>,
    pub kinetics: Option<FileKineticsConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDistillationConfig {
    pub enabled: Option<bool>,
    pub case_type: Option<String>,
    pub light_key: Option<String>,
    pub heavy_key: Option<String>,
    pub reflux_ratios: Option<Vec<f64>>,
    pub stages: Option<Vec<i64>>,
    pub condenser_pressure: Option<f64>,
    pub reboiler_pressure: Option<f64>,
    pub light_key_fraction: Option<f64>,
    pub feed: Option<FileFeedConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading screening configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
