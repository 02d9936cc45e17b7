use flowscreen::engine::config::ScreeningConfig;
use std::path::PathBuf;

/// Everything the `run` command needs after all configuration layers are merged.
pub struct AppConfig {
    pub backend: String,
    pub output_path: PathBuf,
    pub screening: ScreeningConfig,
}
