use crate::adapter::{EngineProvider, SimulationEngine};
use crate::engine::aggregator::ResultAggregator;
use crate::engine::config::ScreeningConfig;
use crate::engine::error::ScreeningError;
use crate::engine::executor::CaseExecutor;
use crate::engine::generator::CaseGenerator;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

/// Acquires an engine from `provider` and screens every study in `config`.
///
/// Fails only when the configuration is invalid or the engine cannot be acquired; both
/// are checked before the first case runs.
#[instrument(skip_all, name = "screening_workflow", fields(backend = provider.backend()))]
pub fn run(
    provider: &dyn EngineProvider,
    config: &ScreeningConfig,
    reporter: &ProgressReporter,
) -> Result<ResultAggregator, ScreeningError> {
    for study in &config.studies {
        study.validate()?;
    }
    let mut engine = provider
        .connect()
        .map_err(ScreeningError::EngineUnavailable)?;
    info!(engine = engine.name(), "Simulation engine acquired");
    Ok(run_with_engine(engine.as_mut(), config, reporter))
}

/// Screens every study in `config` against an already acquired engine.
///
/// Studies run in configuration order, and each study's cases run in generator order.
/// Every case produces exactly one row, whatever happens inside it.
pub fn run_with_engine(
    engine: &mut dyn SimulationEngine,
    config: &ScreeningConfig,
    reporter: &ProgressReporter,
) -> ResultAggregator {
    let mut aggregator = ResultAggregator::new();

    for study in &config.studies {
        let generator = CaseGenerator::new(study.parameter_axes());
        let total = generator.len();

        // === Phase: one study ===
        reporter.report(Progress::PhaseStart {
            name: study.case_type().to_string(),
        });
        info!(case_type = study.case_type(), cases = total, "Starting study");
        reporter.report(Progress::TaskStart {
            total_steps: total as u64,
        });

        let mut failures = 0usize;
        for parameters in &generator {
            let report = CaseExecutor::new(&mut *engine).execute(study, parameters);
            let row = report.row;
            if !row.success() {
                failures += 1;
            }
            reporter.report(Progress::CaseFinished {
                case_type: row.case_type().to_string(),
                label: row.parameters().to_string(),
                success: row.success(),
                error: row.error().to_string(),
            });
            aggregator.push(row);
            reporter.report(Progress::TaskIncrement);
        }

        reporter.report(Progress::TaskFinish);
        if failures > 0 {
            warn!(case_type = study.case_type(), failures, "Study finished with failed cases");
        } else {
            info!(case_type = study.case_type(), "Study finished");
        }
        reporter.report(Progress::PhaseFinish);
    }

    info!(
        rows = aggregator.len(),
        succeeded = aggregator.success_count(),
        "Screening complete"
    );
    aggregator
}
