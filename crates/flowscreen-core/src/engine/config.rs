use super::aggregator::RESERVED_COLUMNS;
use super::metrics;
use crate::core::models::parameters::ParameterAxis;
use crate::core::models::property::PropertyValue;
use crate::core::models::reaction::ReactionDefinition;
use crate::core::models::stream::StreamSpec;
use crate::core::models::unit::UnitKind;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid study '{study}': {reason}")]
    InvalidStudy { study: String, reason: String },
}

/// The object inside a case's flowsheet that a property write is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRole {
    Feed,
    /// The study's reactor or column.
    Main,
}

/// A sweep axis together with the property each of its values is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub axis: ParameterAxis,
    pub target: UnitRole,
    pub property: String,
}

impl AxisSpec {
    pub fn new(axis: ParameterAxis, target: UnitRole, property: impl Into<String>) -> Self {
        Self {
            axis,
            target,
            property: property.into(),
        }
    }
}

/// A property written identically in every case of a study.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedProperty {
    pub target: UnitRole,
    pub property: String,
    pub value: PropertyValue,
}

impl FixedProperty {
    pub fn new(target: UnitRole, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            target,
            property: property.into(),
            value: value.into(),
        }
    }
}

/// The reaction set created when a context has none to reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSetSpec {
    pub name: String,
    pub label: String,
}

impl Default for ReactionSetSpec {
    fn default() -> Self {
        Self {
            name: "Set-1".to_string(),
            label: "Default Set".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactorStudy {
    pub case_type: String,
    pub compounds: Vec<String>,
    pub feed: StreamSpec,
    pub reaction: ReactionDefinition,
    pub reaction_set: ReactionSetSpec,
    /// Compound whose consumption defines conversion.
    pub limiting_reactant: String,
    /// Compound whose outlet flow is reported.
    pub product: String,
    pub axes: Vec<AxisSpec>,
    pub fixed: Vec<FixedProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistillationStudy {
    pub case_type: String,
    pub compounds: Vec<String>,
    pub feed: StreamSpec,
    pub light_key: String,
    pub heavy_key: String,
    pub axes: Vec<AxisSpec>,
    pub fixed: Vec<FixedProperty>,
}

/// One study template. Each variant drives the same executor.
#[derive(Debug, Clone, PartialEq)]
pub enum StudyKind {
    Reactor(ReactorStudy),
    Distillation(DistillationStudy),
}

impl StudyKind {
    pub fn case_type(&self) -> &str {
        match self {
            StudyKind::Reactor(s) => &s.case_type,
            StudyKind::Distillation(s) => &s.case_type,
        }
    }

    pub fn compounds(&self) -> &[String] {
        match self {
            StudyKind::Reactor(s) => &s.compounds,
            StudyKind::Distillation(s) => &s.compounds,
        }
    }

    pub fn feed(&self) -> &StreamSpec {
        match self {
            StudyKind::Reactor(s) => &s.feed,
            StudyKind::Distillation(s) => &s.feed,
        }
    }

    pub fn axes(&self) -> &[AxisSpec] {
        match self {
            StudyKind::Reactor(s) => &s.axes,
            StudyKind::Distillation(s) => &s.axes,
        }
    }

    pub fn fixed(&self) -> &[FixedProperty] {
        match self {
            StudyKind::Reactor(s) => &s.fixed,
            StudyKind::Distillation(s) => &s.fixed,
        }
    }

    pub fn main_unit_kind(&self) -> UnitKind {
        match self {
            StudyKind::Reactor(_) => UnitKind::PfrReactor,
            StudyKind::Distillation(_) => UnitKind::ShortcutColumn,
        }
    }

    /// The axes in sweep order, ready for the case generator.
    pub fn parameter_axes(&self) -> Vec<ParameterAxis> {
        self.axes().iter().map(|a| a.axis.clone()).collect()
    }

    pub fn axis(&self, name: &str) -> Option<&AxisSpec> {
        self.axes().iter().find(|a| a.axis.name() == name)
    }

    /// The metric columns every case of this study reports, in extraction order.
    pub fn metric_names(&self) -> Vec<String> {
        match self {
            StudyKind::Reactor(s) => vec![
                metrics::CONVERSION.to_string(),
                metrics::outlet_flow(&s.product),
                metrics::OUTLET_TEMPERATURE.to_string(),
                metrics::HEAT_DUTY.to_string(),
            ],
            StudyKind::Distillation(_) => vec![
                metrics::DISTILLATE_PURITY.to_string(),
                metrics::CONDENSER_DUTY.to_string(),
                metrics::REBOILER_DUTY.to_string(),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidStudy {
            study: self.case_type().to_string(),
            reason,
        };
        if self.case_type().trim().is_empty() {
            return Err(invalid("case type must not be empty".to_string()));
        }
        let compounds = self.compounds();
        if compounds.is_empty() {
            return Err(invalid("at least one compound is required".to_string()));
        }
        let known = |name: &str| compounds.iter().any(|c| c == name);

        match self.feed().composition() {
            None => return Err(invalid("feed composition is missing".to_string())),
            Some(z) if z.len() != compounds.len() => {
                return Err(invalid(format!(
                    "feed composition has {} entries but {} compounds are listed",
                    z.len(),
                    compounds.len()
                )));
            }
            Some(_) => {}
        }

        let metric_names = self.metric_names();
        let mut seen = HashSet::new();
        for spec in self.axes() {
            let name = spec.axis.name();
            if !seen.insert(name) {
                return Err(invalid(format!("axis '{}' is listed twice", name)));
            }
            if RESERVED_COLUMNS.iter().any(|r| *r == name) {
                return Err(invalid(format!("axis '{}' reuses a reserved result column", name)));
            }
            if metric_names.iter().any(|m| m == name) {
                return Err(invalid(format!("axis '{}' reuses a metric column", name)));
            }
        }

        match self {
            StudyKind::Reactor(s) => {
                for (role, name) in [("limiting reactant", &s.limiting_reactant), ("product", &s.product)] {
                    if !known(name.as_str()) {
                        return Err(invalid(format!("{} '{}' is not a study compound", role, name)));
                    }
                }
                if let Some(missing) = s.reaction.compounds().find(|c| !known(*c)) {
                    return Err(invalid(format!(
                        "reaction '{}' references unknown compound '{}'",
                        s.reaction.name, missing
                    )));
                }
            }
            StudyKind::Distillation(s) => {
                for (role, name) in [("light key", &s.light_key), ("heavy key", &s.heavy_key)] {
                    if !known(name.as_str()) {
                        return Err(invalid(format!("{} '{}' is not a study compound", role, name)));
                    }
                }
                if s.light_key == s.heavy_key {
                    return Err(invalid("light and heavy keys must differ".to_string()));
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ReactorStudyBuilder {
    case_type: Option<String>,
    compounds: Option<Vec<String>>,
    feed: Option<StreamSpec>,
    reaction: Option<ReactionDefinition>,
    reaction_set: Option<ReactionSetSpec>,
    limiting_reactant: Option<String>,
    product: Option<String>,
    axes: Vec<AxisSpec>,
    fixed: Vec<FixedProperty>,
}

impl ReactorStudyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_type(mut self, case_type: impl Into<String>) -> Self {
        self.case_type = Some(case_type.into());
        self
    }
    pub fn compounds<I, S>(mut self, compounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compounds = Some(compounds.into_iter().map(Into::into).collect());
        self
    }
    pub fn feed(mut self, feed: StreamSpec) -> Self {
        self.feed = Some(feed);
        self
    }
    pub fn reaction(mut self, reaction: ReactionDefinition) -> Self {
        self.reaction = Some(reaction);
        self
    }
    pub fn reaction_set(mut self, spec: ReactionSetSpec) -> Self {
        self.reaction_set = Some(spec);
        self
    }
    pub fn limiting_reactant(mut self, compound: impl Into<String>) -> Self {
        self.limiting_reactant = Some(compound.into());
        self
    }
    pub fn product(mut self, compound: impl Into<String>) -> Self {
        self.product = Some(compound.into());
        self
    }
    pub fn axis(mut self, axis: AxisSpec) -> Self {
        self.axes.push(axis);
        self
    }
    pub fn fixed(mut self, property: FixedProperty) -> Self {
        self.fixed.push(property);
        self
    }

    pub fn build(self) -> Result<StudyKind, ConfigError> {
        let study = StudyKind::Reactor(ReactorStudy {
            case_type: self.case_type.unwrap_or_else(|| "PFR_Sweep".to_string()),
            compounds: self
                .compounds
                .ok_or(ConfigError::MissingParameter("compounds"))?,
            feed: self.feed.ok_or(ConfigError::MissingParameter("feed"))?,
            reaction: self
                .reaction
                .ok_or(ConfigError::MissingParameter("reaction"))?,
            reaction_set: self.reaction_set.unwrap_or_default(),
            limiting_reactant: self
                .limiting_reactant
                .ok_or(ConfigError::MissingParameter("limiting_reactant"))?,
            product: self
                .product
                .ok_or(ConfigError::MissingParameter("product"))?,
            axes: self.axes,
            fixed: self.fixed,
        });
        study.validate()?;
        Ok(study)
    }
}

#[derive(Default)]
pub struct DistillationStudyBuilder {
    case_type: Option<String>,
    compounds: Option<Vec<String>>,
    feed: Option<StreamSpec>,
    light_key: Option<String>,
    heavy_key: Option<String>,
    axes: Vec<AxisSpec>,
    fixed: Vec<FixedProperty>,
}

impl DistillationStudyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_type(mut self, case_type: impl Into<String>) -> Self {
        self.case_type = Some(case_type.into());
        self
    }
    pub fn compounds<I, S>(mut self, compounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compounds = Some(compounds.into_iter().map(Into::into).collect());
        self
    }
    pub fn feed(mut self, feed: StreamSpec) -> Self {
        self.feed = Some(feed);
        self
    }
    pub fn light_key(mut self, compound: impl Into<String>) -> Self {
        self.light_key = Some(compound.into());
        self
    }
    pub fn heavy_key(mut self, compound: impl Into<String>) -> Self {
        self.heavy_key = Some(compound.into());
        self
    }
    pub fn axis(mut self, axis: AxisSpec) -> Self {
        self.axes.push(axis);
        self
    }
    pub fn fixed(mut self, property: FixedProperty) -> Self {
        self.fixed.push(property);
        self
    }

    pub fn build(self) -> Result<StudyKind, ConfigError> {
        let study = StudyKind::Distillation(DistillationStudy {
            case_type: self
                .case_type
                .unwrap_or_else(|| "Distillation_Sweep".to_string()),
            compounds: self
                .compounds
                .ok_or(ConfigError::MissingParameter("compounds"))?,
            feed: self.feed.ok_or(ConfigError::MissingParameter("feed"))?,
            light_key: self
                .light_key
                .ok_or(ConfigError::MissingParameter("light_key"))?,
            heavy_key: self
                .heavy_key
                .ok_or(ConfigError::MissingParameter("heavy_key"))?,
            axes: self.axes,
            fixed: self.fixed,
        });
        study.validate()?;
        Ok(study)
    }
}

/// Everything a screening run needs besides the engine: the studies, in run order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub studies: Vec<StudyKind>,
}

#[derive(Default)]
pub struct ScreeningConfigBuilder {
    studies: Vec<StudyKind>,
}

impl ScreeningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn study(mut self, study: StudyKind) -> Self {
        self.studies.push(study);
        self
    }

    pub fn build(self) -> Result<ScreeningConfig, ConfigError> {
        if self.studies.is_empty() {
            return Err(ConfigError::MissingParameter("studies"));
        }
        for study in &self.studies {
            study.validate()?;
        }
        Ok(ScreeningConfig {
            studies: self.studies,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::core::models::property::names;
    use crate::core::models::stream::Position;

    #[test]
    fn reactor_builder_reports_first_missing_parameter() {
        let result = ReactorStudyBuilder::new().compounds(["Water"]).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("feed")));
    }

    #[test]
    fn composition_length_must_match_compounds() {
        let feed = StreamSpec::new("Feed", Position::default())
            .with_property(names::COMPOSITION, vec![1.0]);
        let result = DistillationStudyBuilder::new()
            .compounds(["Ethanol", "Water"])
            .feed(feed)
            .light_key("Ethanol")
            .heavy_key("Water")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidStudy { .. })));
    }

    #[test]
    fn keys_must_be_study_compounds() {
        let feed = StreamSpec::new("Feed", Position::default())
            .with_property(names::COMPOSITION, vec![0.5, 0.5]);
        let result = DistillationStudyBuilder::new()
            .compounds(["Ethanol", "Water"])
            .feed(feed)
            .light_key("Methanol")
            .heavy_key("Water")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidStudy { ref reason, .. }) if reason.contains("Methanol")
        ));
    }

    #[test]
    fn duplicate_axis_names_are_rejected() {
        let study = reactor_study(&[300.0], &[1.0]);
        let StudyKind::Reactor(mut inner) = study else {
            panic!("expected a reactor study");
        };
        let duplicate = inner.axes[0].clone();
        inner.axes.push(duplicate);
        assert!(StudyKind::Reactor(inner).validate().is_err());
    }

    fn rename_first_axis(study: StudyKind, name: &str) -> StudyKind {
        let mut study = study;
        let axes = match &mut study {
            StudyKind::Reactor(s) => &mut s.axes,
            StudyKind::Distillation(s) => &mut s.axes,
        };
        let values: Vec<_> = axes[0].axis.values().to_vec();
        axes[0].axis = ParameterAxis::new(name, values);
        study
    }

    #[test]
    fn axis_named_like_a_reserved_column_is_rejected() {
        for reserved in RESERVED_COLUMNS {
            let study = rename_first_axis(reactor_study(&[300.0], &[1.0]), reserved);
            assert!(
                matches!(
                    study.validate(),
                    Err(ConfigError::InvalidStudy { ref reason, .. }) if reason.contains("reserved")
                ),
                "axis '{}' should be rejected",
                reserved
            );
        }
    }

    #[test]
    fn axis_named_like_a_metric_is_rejected() {
        let reactor = rename_first_axis(reactor_study(&[300.0], &[1.0]), "Conversion");
        assert!(matches!(
            reactor.validate(),
            Err(ConfigError::InvalidStudy { ref reason, .. }) if reason.contains("metric")
        ));

        let flow = rename_first_axis(reactor_study(&[300.0], &[1.0]), "OutletFlow_Ethanol_mol_s");
        assert!(flow.validate().is_err());

        let column = rename_first_axis(distillation_study(&[2.0], &[15]), "DistillatePurity");
        assert!(column.validate().is_err());

        // Another study's metric name is free to use.
        let other = rename_first_axis(distillation_study(&[2.0], &[15]), "Conversion");
        assert!(other.validate().is_ok());
    }

    #[test]
    fn metric_names_follow_the_study_kind() {
        assert_eq!(
            reactor_study(&[300.0], &[1.0]).metric_names(),
            vec![
                "Conversion",
                "OutletFlow_Ethanol_mol_s",
                "OutletTemperature_K",
                "HeatDuty_kW"
            ]
        );
        assert_eq!(
            distillation_study(&[2.0], &[15]).metric_names(),
            vec!["DistillatePurity", "CondenserDuty_kW", "ReboilerDuty_kW"]
        );
    }

    #[test]
    fn screening_config_requires_a_study() {
        assert_eq!(
            ScreeningConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("studies"))
        );
        let config = ScreeningConfigBuilder::new()
            .study(reactor_study(&[300.0], &[1.0]))
            .study(distillation_study(&[2.0], &[15]))
            .build()
            .unwrap();
        assert_eq!(config.studies.len(), 2);
        assert_eq!(config.studies[1].case_type(), "Distillation_Sweep");
        assert_eq!(config.studies[0].main_unit_kind(), UnitKind::PfrReactor);
    }

    #[test]
    fn axis_lookup_finds_target() {
        let study = reactor_study(&[300.0, 325.0], &[1.0]);
        let axis = study.axis("Volume_m3").unwrap();
        assert_eq!(axis.target, UnitRole::Main);
        assert_eq!(axis.property, names::VOLUME);
        assert!(study.axis("Pressure").is_none());
    }
}
