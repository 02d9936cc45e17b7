use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use flowscreen::adapter::{SimulationEngine, provider_for};
use flowscreen::core::models::stream::Position;
use flowscreen::core::models::unit::{UnitHandle, UnitKind};
use flowscreen::engine::binding::PropertyBindingResolver;
use flowscreen::engine::error::ScreeningError;
use tracing::{info, warn};

const INSPECT_TAG: &str = "Inspect-1";

/// What `inspect` found out about one unit kind.
#[derive(Debug)]
pub struct UnitReport {
    pub kind: UnitKind,
    pub properties: Vec<String>,
    pub dynamic_attributes: bool,
    /// The reaction-set binding strategy that would win, for reactors only.
    pub binding: Option<Option<&'static str>>,
}

pub async fn run(args: InspectArgs) -> Result<()> {
    let kind: UnitKind = args.kind.parse().map_err(CliError::Argument)?;
    let provider = provider_for(&args.backend).map_err(ScreeningError::EngineUnavailable)?;
    let mut engine = provider.connect().map_err(ScreeningError::EngineUnavailable)?;
    info!("Inspecting a {} on the '{}' engine.", kind, engine.name());

    let report = inspect_unit(engine.as_mut(), kind, args.filter.as_deref())?;

    println!("{} ({} properties):", report.kind, report.properties.len());
    for property in &report.properties {
        println!("  {}", property);
    }
    println!(
        "Dynamic attributes: {}",
        if report.dynamic_attributes { "accepted" } else { "not accepted" }
    );
    match report.binding {
        Some(Some(strategy)) => println!("Reaction set binding: {}", strategy),
        Some(None) => println!("Reaction set binding: no applicable strategy"),
        None => {}
    }
    Ok(())
}

/// Creates a throwaway context holding one unit of `kind` and describes that unit.
pub fn inspect_unit(
    engine: &mut dyn SimulationEngine,
    kind: UnitKind,
    filter: Option<&str>,
) -> Result<UnitReport> {
    let ctx = engine.create_context()?;
    let unit = engine.add_unit(ctx, kind, Position::default(), INSPECT_TAG);
    if let Err(e) = engine.release_context(ctx) {
        warn!("Failed to release inspection context: {}", e);
    }
    Ok(describe(&unit?, filter))
}

fn describe(unit: &UnitHandle, filter: Option<&str>) -> UnitReport {
    let needle = filter.map(str::to_lowercase);
    let properties = unit
        .capabilities()
        .properties()
        .filter(|p| {
            needle
                .as_deref()
                .is_none_or(|n| p.to_lowercase().contains(n))
        })
        .map(str::to_string)
        .collect();

    let binding = (unit.kind() == UnitKind::PfrReactor).then(|| {
        PropertyBindingResolver::reaction_set()
            .applicable(unit)
            .first()
            .map(|s| s.name)
    });

    UnitReport {
        kind: unit.kind(),
        properties,
        dynamic_attributes: unit.capabilities().accepts_dynamic_attributes(),
        binding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowscreen::adapter::reference::ReferenceEngine;

    #[test]
    fn reactor_report_names_winning_binding_strategy() {
        let mut engine = ReferenceEngine::default();
        let report = inspect_unit(&mut engine, UnitKind::PfrReactor, None).unwrap();
        assert!(report.properties.iter().any(|p| p == "Volume"));
        assert_eq!(report.binding, Some(Some("identifier property 'ReactionSetID'")));
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut engine = ReferenceEngine::default();
        let report = inspect_unit(&mut engine, UnitKind::ShortcutColumn, Some("duty")).unwrap();
        assert_eq!(report.properties, vec!["Condenser Duty", "Reboiler Duty"]);
        assert_eq!(report.binding, None);
    }

    #[test]
    fn reactor_without_binding_surface_reports_none() {
        let mut engine = ReferenceEngine::builder()
            .reactor_binding_properties(Vec::<String>::new())
            .dynamic_attributes(false)
            .build();
        let report = inspect_unit(&mut engine, UnitKind::PfrReactor, None).unwrap();
        assert_eq!(report.binding, Some(None));
        assert!(!report.dynamic_attributes);
    }

    #[tokio::test]
    async fn unknown_kind_is_an_argument_error() {
        let args = InspectArgs {
            kind: "boiler".to_string(),
            filter: None,
            backend: "reference".to_string(),
        };
        assert!(matches!(run(args).await, Err(CliError::Argument(_))));
    }
}
