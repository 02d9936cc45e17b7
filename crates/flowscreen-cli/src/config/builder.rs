use super::defaults::{DefaultsConfig, DistillationDefaults, ReactorDefaults};
use super::file::{
    FileConfig, FileDistillationConfig, FileFeedConfig, FileKineticsConfig, FileReactorConfig,
};
use super::models::AppConfig;
use crate::cli::{RunArgs, StudySelection};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use flowscreen::core::models::parameters::ParameterAxis;
use flowscreen::core::models::property::names;
use flowscreen::core::models::reaction::{KineticParameters, ReactionDefinition};
use flowscreen::core::models::stream::{Position, StreamSpec};
use flowscreen::engine::config::{
    self as core_config, AxisSpec, DistillationStudyBuilder, FixedProperty, ReactorStudyBuilder,
    ScreeningConfigBuilder, StudyKind, UnitRole,
};
use tracing::debug;

const FEED_TAG: &str = "Feed";
const FEED_POSITION: Position = Position::new(50, 50);
const REACTION_NAME: &str = "Rxn-1";

pub const TEMPERATURE_AXIS: &str = "Temperature_K";
pub const VOLUME_AXIS: &str = "Volume_m3";
pub const REFLUX_AXIS: &str = "RefluxRatio";
pub const STAGES_AXIS: &str = "Stages";

/// Merges built-in defaults, the optional config file, `--set` overrides and the
/// remaining command-line flags, in increasing order of precedence.
pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let backend = args
        .backend
        .clone()
        .or(file_config.engine.take().and_then(|e| e.backend))
        .unwrap_or(defaults.backend);
    let output_path = args
        .output
        .clone()
        .or(file_config.output.take().and_then(|o| o.path))
        .unwrap_or(defaults.output_path);

    let reactor_file = file_config.reactor.take().unwrap_or_default();
    let distillation_file = file_config.distillation.take().unwrap_or_default();
    let (run_reactor, run_distillation) = match args.study {
        StudySelection::Reactor => (true, false),
        StudySelection::Distillation => (false, true),
        StudySelection::All => (
            reactor_file.enabled.unwrap_or(true),
            distillation_file.enabled.unwrap_or(true),
        ),
    };

    let mut builder = ScreeningConfigBuilder::new();
    if run_reactor {
        builder = builder.study(build_reactor_study(reactor_file, &defaults.reactor)?);
    } else {
        debug!("Reactor study disabled.");
    }
    if run_distillation {
        builder = builder.study(build_distillation_study(
            distillation_file,
            &defaults.distillation,
        )?);
    } else {
        debug!("Distillation study disabled.");
    }
    let screening = builder.build().map_err(config_error)?;

    Ok(AppConfig {
        backend,
        output_path,
        screening,
    })
}

fn config_error(e: core_config::ConfigError) -> CliError {
    CliError::Config(e.to_string())
}

fn feed_stream(
    file: Option<FileFeedConfig>,
    temperature: f64,
    pressure: f64,
    mass_flow: f64,
    composition: &[f64],
) -> StreamSpec {
    let file = file.unwrap_or_default();
    StreamSpec::new(FEED_TAG, FEED_POSITION)
        .with_property(names::TEMPERATURE, file.temperature.unwrap_or(temperature))
        .with_property(names::PRESSURE, file.pressure.unwrap_or(pressure))
        .with_property(names::MASS_FLOW, file.mass_flow.unwrap_or(mass_flow))
        .with_property(
            names::COMPOSITION,
            file.composition.unwrap_or_else(|| composition.to_vec()),
        )
}

fn build_reactor_study(file: FileReactorConfig, defaults: &ReactorDefaults) -> Result<StudyKind> {
    let reactant = file.reactant.unwrap_or_else(|| defaults.reactant.clone());
    let product = file.product.unwrap_or_else(|| defaults.product.clone());
    let kinetics = file.kinetics.unwrap_or_default();

    let reaction = ReactionDefinition::irreversible(
        REACTION_NAME,
        &reactant,
        &product,
        kinetics.order.unwrap_or(defaults.reaction_order),
        KineticParameters {
            forward_factor: kinetics
                .pre_exponential_factor
                .unwrap_or(defaults.pre_exponential_factor),
            forward_activation_energy: kinetics
                .activation_energy
                .unwrap_or(defaults.activation_energy),
            ..Default::default()
        },
    );
    let feed = feed_stream(
        file.feed,
        defaults.feed_temperature,
        defaults.feed_pressure,
        defaults.feed_mass_flow,
        &defaults.feed_composition,
    );
    let temperatures = file
        .temperatures
        .unwrap_or_else(|| defaults.temperatures.clone());
    let volumes = file.volumes.unwrap_or_else(|| defaults.volumes.clone());

    ReactorStudyBuilder::new()
        .case_type(file.case_type.unwrap_or_else(|| defaults.case_type.clone()))
        .compounds([reactant.as_str(), product.as_str()])
        .feed(feed)
        .reaction(reaction)
        .limiting_reactant(reactant.as_str())
        .product(product.as_str())
        .axis(AxisSpec::new(
            ParameterAxis::new(TEMPERATURE_AXIS, temperatures),
            UnitRole::Feed,
            names::TEMPERATURE,
        ))
        .axis(AxisSpec::new(
            ParameterAxis::new(VOLUME_AXIS, volumes),
            UnitRole::Main,
            names::VOLUME,
        ))
        .fixed(FixedProperty::new(
            UnitRole::Main,
            names::OPERATION_MODE,
            file.operation_mode.unwrap_or(defaults.operation_mode),
        ))
        .build()
        .map_err(config_error)
}

fn build_distillation_study(
    file: FileDistillationConfig,
    defaults: &DistillationDefaults,
) -> Result<StudyKind> {
    let light_key = file.light_key.unwrap_or_else(|| defaults.light_key.clone());
    let heavy_key = file.heavy_key.unwrap_or_else(|| defaults.heavy_key.clone());
    let feed = feed_stream(
        file.feed,
        defaults.feed_temperature,
        defaults.feed_pressure,
        defaults.feed_mass_flow,
        &defaults.feed_composition,
    );
    let reflux_ratios = file
        .reflux_ratios
        .unwrap_or_else(|| defaults.reflux_ratios.clone());
    let stages = file.stages.unwrap_or_else(|| defaults.stages.clone());

    DistillationStudyBuilder::new()
        .case_type(file.case_type.unwrap_or_else(|| defaults.case_type.clone()))
        .compounds([light_key.as_str(), heavy_key.as_str()])
        .feed(feed)
        .light_key(light_key.as_str())
        .heavy_key(heavy_key.as_str())
        .axis(AxisSpec::new(
            ParameterAxis::new(REFLUX_AXIS, reflux_ratios),
            UnitRole::Main,
            names::REFLUX_RATIO,
        ))
        .axis(AxisSpec::new(
            ParameterAxis::new(STAGES_AXIS, stages),
            UnitRole::Main,
            names::NUMBER_OF_STAGES,
        ))
        .fixed(FixedProperty::new(
            UnitRole::Main,
            names::CONDENSER_PRESSURE,
            file.condenser_pressure.unwrap_or(defaults.condenser_pressure),
        ))
        .fixed(FixedProperty::new(
            UnitRole::Main,
            names::REBOILER_PRESSURE,
            file.reboiler_pressure.unwrap_or(defaults.reboiler_pressure),
        ))
        .fixed(FixedProperty::new(
            UnitRole::Main,
            names::LIGHT_KEY_FRACTION,
            file.light_key_fraction.unwrap_or(defaults.light_key_fraction),
        ))
        .build()
        .map_err(config_error)
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for pair in set_values {
        let (key, value) = parser::parse_assignment(pair).map_err(set_error)?;
        debug!(key, value, "Applying --set override");
        match key {
            "engine.backend" => {
                config.engine.get_or_insert_with(Default::default).backend = Some(value.to_string());
            }
            "output.path" => {
                config.output.get_or_insert_with(Default::default).path = Some(value.into());
            }
            _ => {
                if let Some(field) = key.strip_prefix("reactor.") {
                    let reactor = config.reactor.get_or_insert_with(Default::default);
                    set_reactor_field(reactor, key, field, value)?;
                } else if let Some(field) = key.strip_prefix("distillation.") {
                    let distillation = config.distillation.get_or_insert_with(Default::default);
                    set_distillation_field(distillation, key, field, value)?;
                } else {
                    return Err(unsupported(key));
                }
            }
        }
    }
    Ok(config)
}

fn set_error(e: ParseError) -> CliError {
    CliError::Config(e.to_string())
}

fn unsupported(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

fn set_reactor_field(
    reactor: &mut FileReactorConfig,
    key: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    if let Some(feed_field) = field.strip_prefix("feed.") {
        return set_feed_field(reactor.feed.get_or_insert_with(Default::default), key, feed_field, value);
    }
    if let Some(kinetics_field) = field.strip_prefix("kinetics.") {
        let kinetics: &mut FileKineticsConfig = reactor.kinetics.get_or_insert_with(Default::default);
        let number = Some(parser::parse_value(key, value, "float").map_err(set_error)?);
        match kinetics_field {
            "order" => kinetics.order = number,
            "pre-exponential-factor" => kinetics.pre_exponential_factor = number,
            "activation-energy" => kinetics.activation_energy = number,
            _ => return Err(unsupported(key)),
        }
        return Ok(());
    }
    match field {
        "enabled" => reactor.enabled = Some(parser::parse_value(key, value, "boolean").map_err(set_error)?),
        "case-type" => reactor.case_type = Some(value.to_string()),
        "reactant" => reactor.reactant = Some(value.to_string()),
        "product" => reactor.product = Some(value.to_string()),
        "temperatures" => {
            reactor.temperatures = Some(parser::parse_list(key, value, "float").map_err(set_error)?)
        }
        "volumes" => reactor.volumes = Some(parser::parse_list(key, value, "float").map_err(set_error)?),
        "operation-mode" => {
            reactor.operation_mode = Some(parser::parse_value(key, value, "integer").map_err(set_error)?)
        }
        _ => return Err(unsupported(key)),
    }
    Ok(())
}

fn set_distillation_field(
    distillation: &mut FileDistillationConfig,
    key: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    if let Some(feed_field) = field.strip_prefix("feed.") {
        return set_feed_field(
            distillation.feed.get_or_insert_with(Default::default),
            key,
            feed_field,
            value,
        );
    }
    let float = |v: &str| parser::parse_value::<f64>(key, v, "float").map_err(set_error);
    match field {
        "enabled" => {
            distillation.enabled = Some(parser::parse_value(key, value, "boolean").map_err(set_error)?)
        }
        "case-type" => distillation.case_type = Some(value.to_string()),
        "light-key" => distillation.light_key = Some(value.to_string()),
        "heavy-key" => distillation.heavy_key = Some(value.to_string()),
        "reflux-ratios" => {
            distillation.reflux_ratios = Some(parser::parse_list(key, value, "float").map_err(set_error)?)
        }
        "stages" => distillation.stages = Some(parser::parse_list(key, value, "integer").map_err(set_error)?),
        "condenser-pressure" => distillation.condenser_pressure = Some(float(value)?),
        "reboiler-pressure" => distillation.reboiler_pressure = Some(float(value)?),
        "light-key-fraction" => distillation.light_key_fraction = Some(float(value)?),
        _ => return Err(unsupported(key)),
    }
    Ok(())
}

fn set_feed_field(feed: &mut FileFeedConfig, key: &str, field: &str, value: &str) -> Result<()> {
    let float = |v: &str| parser::parse_value::<f64>(key, v, "float").map_err(set_error);
    match field {
        "temperature" => feed.temperature = Some(float(value)?),
        "pressure" => feed.pressure = Some(float(value)?),
        "mass-flow" => feed.mass_flow = Some(float(value)?),
        "composition" => feed.composition = Some(parser::parse_list(key, value, "float").map_err(set_error)?),
        _ => return Err(unsupported(key)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowscreen::core::models::property::PropertyValue;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_run_args() -> RunArgs {
        RunArgs {
            config: None,
            output: None,
            study: StudySelection::All,
            backend: None,
            set_values: vec![],
        }
    }

    fn axis_values(study: &StudyKind, name: &str) -> Vec<f64> {
        study
            .axis(name)
            .unwrap()
            .axis
            .values()
            .iter()
            .filter_map(|v| v.as_f64())
            .collect()
    }

    #[test]
    fn defaults_reproduce_both_studies() {
        let app = build_config(&base_run_args()).expect("build ok");
        assert_eq!(app.backend, "reference");
        assert_eq!(app.output_path, PathBuf::from("results.csv"));

        let studies = &app.screening.studies;
        assert_eq!(studies.len(), 2);
        assert_eq!(studies[0].case_type(), "PFR_Sweep");
        assert_eq!(studies[0].compounds(), ["Water", "Ethanol"]);
        assert_eq!(axis_values(&studies[0], TEMPERATURE_AXIS), vec![300.0, 325.0, 350.0]);
        assert_eq!(axis_values(&studies[0], VOLUME_AXIS), vec![1.0, 2.0, 3.0]);
        assert_eq!(studies[1].case_type(), "Distillation_Sweep");
        assert_eq!(axis_values(&studies[1], STAGES_AXIS), vec![10.0, 15.0, 20.0]);
        assert_eq!(
            studies[1].feed().get(names::MASS_FLOW),
            Some(&PropertyValue::Number(5000.0))
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("screening.toml");
        let toml = r#"
            [output]
            path = "from-file.csv"

            [reactor]
            temperatures = [310.0, 320.0]
            volumes = [4.0]

            [reactor.feed]
            mass-flow = 1800.0

            [distillation]
            enabled = false
            "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_run_args();
        args.config = Some(cfg_path);
        let app = build_config(&args).expect("build ok");

        assert_eq!(app.output_path, PathBuf::from("from-file.csv"));
        assert_eq!(app.screening.studies.len(), 1);
        let reactor = &app.screening.studies[0];
        assert_eq!(axis_values(reactor, TEMPERATURE_AXIS), vec![310.0, 320.0]);
        assert_eq!(axis_values(reactor, VOLUME_AXIS), vec![4.0]);
        assert_eq!(
            reactor.feed().get(names::MASS_FLOW),
            Some(&PropertyValue::Number(1800.0))
        );
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("screening.toml");
        fs::write(&cfg_path, "[output]\npath = \"from-file.csv\"\n").unwrap();

        let mut args = base_run_args();
        args.config = Some(cfg_path);
        args.set_values = vec!["output.path=from-set.csv".to_string()];
        args.output = Some(PathBuf::from("from-flag.csv"));
        let app = build_config(&args).expect("build ok");
        assert_eq!(app.output_path, PathBuf::from("from-flag.csv"));

        args.output = None;
        let app = build_config(&args).expect("build ok");
        assert_eq!(app.output_path, PathBuf::from("from-set.csv"));
    }

    #[test]
    fn set_values_reach_nested_study_fields() {
        let mut args = base_run_args();
        args.set_values = vec![
            "reactor.volumes=1,5".to_string(),
            "reactor.kinetics.pre-exponential-factor=0.02".to_string(),
            "distillation.stages=8".to_string(),
            "distillation.feed.composition=0.4,0.6".to_string(),
            "engine.backend=reference".to_string(),
        ];
        let app = build_config(&args).expect("build ok");
        let studies = &app.screening.studies;
        assert_eq!(axis_values(&studies[0], VOLUME_AXIS), vec![1.0, 5.0]);
        let StudyKind::Reactor(reactor) = &studies[0] else {
            panic!("expected reactor study first");
        };
        assert!((reactor.reaction.kinetics.forward_factor - 0.02).abs() < 1e-9);
        assert_eq!(axis_values(&studies[1], STAGES_AXIS), vec![8.0]);
        assert_eq!(studies[1].feed().composition(), Some(&[0.4, 0.6][..]));
    }

    #[test]
    fn malformed_or_unknown_set_values_are_rejected() {
        for bad in [
            "reactor.volumes",
            "reactor.volumes=one",
            "reactor.colour=blue",
            "solver.tolerance=1e-6",
        ] {
            let mut args = base_run_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args), Err(CliError::Config(_))),
                "expected config error for {}",
                bad
            );
        }
    }

    #[test]
    fn study_selection_beats_enabled_flags() {
        let mut args = base_run_args();
        args.set_values = vec!["distillation.enabled=false".to_string()];
        args.study = StudySelection::Distillation;
        let app = build_config(&args).expect("build ok");
        assert_eq!(app.screening.studies.len(), 1);
        assert_eq!(app.screening.studies[0].case_type(), "Distillation_Sweep");
    }

    #[test]
    fn disabling_every_study_is_a_config_error() {
        let mut args = base_run_args();
        args.set_values = vec![
            "reactor.enabled=false".to_string(),
            "distillation.enabled=false".to_string(),
        ];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn composition_length_is_validated() {
        let mut args = base_run_args();
        args.set_values = vec!["reactor.feed.composition=1.0".to_string()];
        let err = build_config(&args).err().unwrap();
        assert!(err.to_string().contains("PFR_Sweep"));
    }
}
