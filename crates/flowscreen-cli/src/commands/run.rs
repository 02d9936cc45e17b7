use crate::cli::RunArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use flowscreen::adapter::provider_for;
use flowscreen::engine::error::ScreeningError;
use flowscreen::engine::progress::ProgressReporter;
use flowscreen::workflows;
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let app_config = build_config(&args)?;

    let provider = provider_for(&app_config.backend).map_err(ScreeningError::EngineUnavailable)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting screening of {} stud{} on the '{}' engine...",
        app_config.screening.studies.len(),
        if app_config.screening.studies.len() == 1 { "y" } else { "ies" },
        provider.backend()
    );
    info!("Invoking the core screening workflow...");

    let results = tokio::task::block_in_place(|| {
        workflows::screen::run(provider.as_ref(), &app_config.screening, &reporter)
    })?;

    let failed = results.len() - results.success_count();
    if failed > 0 {
        warn!("{} of {} case(s) did not succeed.", failed, results.len());
    }

    results
        .export(&app_config.output_path)
        .map_err(ScreeningError::from)?;
    println!(
        "Results saved to {} ({} rows).",
        app_config.output_path.display(),
        results.len()
    );

    Ok(())
}
