use super::binding::{BindingTarget, PropertyBindingResolver};
use super::config::{ReactorStudy, StudyKind, UnitRole};
use super::error::CaseError;
use super::metrics::{self, MetricSheet};
use super::state::{CaseStage, CaseTrace};
use crate::adapter::SimulationEngine;
use crate::adapter::error::EngineError;
use crate::core::models::ids::ContextId;
use crate::core::models::parameters::ParameterSet;
use crate::core::models::property::{PropertyValue, names};
use crate::core::models::row::ResultRow;
use crate::core::models::stream::Position;
use crate::core::models::unit::{UnitHandle, UnitKind};
use tracing::{debug, instrument, warn};

const REACTOR_TAG: &str = "PFR-1";
const PRODUCT_TAG: &str = "Product";
const HEAT_TAG: &str = "Heat";
const COLUMN_TAG: &str = "Distillation";
const DISTILLATE_TAG: &str = "Distillate";
const BOTTOMS_TAG: &str = "Bottoms";
const CONDENSER_TAG: &str = "Condenser Duty";
const REBOILER_TAG: &str = "Reboiler Duty";

const REACTOR_POSITION: Position = Position::new(125, 50);
const PRODUCT_POSITION: Position = Position::new(200, 50);
const HEAT_POSITION: Position = Position::new(125, 100);
const COLUMN_POSITION: Position = Position::new(200, 50);
const DISTILLATE_POSITION: Position = Position::new(350, 20);
const BOTTOMS_POSITION: Position = Position::new(350, 80);
const CONDENSER_POSITION: Position = Position::new(200, 0);
const REBOILER_POSITION: Position = Position::new(200, 100);

const NOTE_SEPARATOR: &str = " | ";

/// The row produced for a case together with what the case created along the way.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub row: ResultRow,
    pub trace: CaseTrace,
}

enum Topology {
    Reactor {
        feed: UnitHandle,
        reactor: UnitHandle,
        product: UnitHandle,
        heat: UnitHandle,
    },
    Column {
        feed: UnitHandle,
        column: UnitHandle,
        distillate: UnitHandle,
    },
}

impl Topology {
    fn target(&self, role: UnitRole) -> &UnitHandle {
        match (self, role) {
            (Topology::Reactor { feed, .. }, UnitRole::Feed)
            | (Topology::Column { feed, .. }, UnitRole::Feed) => feed,
            (Topology::Reactor { reactor, .. }, UnitRole::Main) => reactor,
            (Topology::Column { column, .. }, UnitRole::Main) => column,
        }
    }
}

/// Mutable bookkeeping for the case currently running.
#[derive(Default)]
struct CaseRun {
    trace: CaseTrace,
    metrics: MetricSheet,
    solver_errors: Vec<String>,
    solved: bool,
    notes: Vec<String>,
}

impl CaseRun {
    fn enter(&mut self, stage: CaseStage) {
        debug!(%stage, "Entering stage");
        self.trace.enter(stage);
    }

    fn note(&mut self, note: String) {
        warn!("{}", note);
        self.notes.push(note);
    }
}

fn at(stage: CaseStage) -> impl FnOnce(EngineError) -> CaseError {
    move |source| CaseError::new(stage, source)
}

/// Runs single cases against an engine, one isolated context per case.
///
/// [`CaseExecutor::execute`] never fails: whatever happens inside the case ends up in
/// the returned row, and the case's context is released before returning.
pub struct CaseExecutor<'e> {
    engine: &'e mut dyn SimulationEngine,
    resolver: PropertyBindingResolver,
}

impl<'e> CaseExecutor<'e> {
    pub fn new(engine: &'e mut dyn SimulationEngine) -> Self {
        Self {
            engine,
            resolver: PropertyBindingResolver::reaction_set(),
        }
    }

    pub fn with_resolver(mut self, resolver: PropertyBindingResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[instrument(skip_all, name = "case", fields(case_type = %study.case_type(), parameters = %parameters))]
    pub fn execute(&mut self, study: &StudyKind, parameters: ParameterSet) -> CaseReport {
        let mut run = CaseRun::default();
        let failure = self.drive(study, &parameters, &mut run).err();

        run.enter(CaseStage::Record);
        if let Some(ctx) = run.trace.context {
            if let Err(e) = self.engine.release_context(ctx) {
                warn!(error = %e, "Failed to release simulation context");
            }
        }

        let success = run.solved && failure.is_none();
        let mut messages = Vec::new();
        if let Some(failure) = &failure {
            warn!(stage = %failure.stage, error = %failure.source, "Case aborted");
            messages.push(failure.to_string());
        }
        if !run.solver_errors.is_empty() {
            messages.push(run.solver_errors.join("; "));
        }
        messages.extend(run.notes);

        let row = ResultRow::new(
            study.case_type(),
            parameters,
            run.metrics.into_values(),
            success,
            messages.join(NOTE_SEPARATOR),
        );
        CaseReport {
            row,
            trace: run.trace,
        }
    }

    fn drive(
        &mut self,
        study: &StudyKind,
        parameters: &ParameterSet,
        run: &mut CaseRun,
    ) -> Result<(), CaseError> {
        // === INIT ===
        run.enter(CaseStage::Init);
        let ctx = self.engine.create_context().map_err(at(CaseStage::Init))?;
        run.trace.context = Some(ctx);

        // === COMPOUNDS ===
        run.enter(CaseStage::Compounds);
        for compound in study.compounds() {
            match self.engine.add_compound(ctx, compound) {
                Ok(()) => {}
                Err(e) if e.is_duplicate() => {
                    warn!(compound = %compound, "Compound already present in context");
                }
                Err(e) => warn!(compound = %compound, error = %e, "Failed to add compound"),
            }
        }

        // === TOPOLOGY ===
        run.enter(CaseStage::Topology);
        let topology = self.build_topology(ctx, study, run)?;
        let feed = topology.target(UnitRole::Feed).clone();
        for (property, value) in study.feed().properties() {
            self.write_property(&feed, property, value.clone());
        }

        // === REACTION_DEFINE / REACTION_BIND ===
        if let (StudyKind::Reactor(reactor_study), Topology::Reactor { reactor, .. }) =
            (study, &topology)
        {
            run.enter(CaseStage::ReactionDefine);
            let target = self.define_reaction(ctx, reactor_study, run)?;

            run.enter(CaseStage::ReactionBind);
            let outcome = self.resolver.resolve(&mut *self.engine, reactor, &target);
            if let Some(note) = outcome.note(self.resolver.intent()) {
                run.note(note);
            }
            run.trace.binding = Some(outcome);
        }

        // === UNIT_CONFIGURE ===
        run.enter(CaseStage::UnitConfigure);
        for fixed in study.fixed() {
            let unit = topology.target(fixed.target).clone();
            self.write_property(&unit, &fixed.property, fixed.value.clone());
        }
        for (name, value) in parameters.iter() {
            match study.axis(name) {
                Some(spec) => {
                    let unit = topology.target(spec.target).clone();
                    self.write_property(&unit, &spec.property, PropertyValue::from(value));
                }
                None => warn!(parameter = name, "No axis target for parameter, skipping"),
            }
        }

        // === SOLVE ===
        run.enter(CaseStage::Solve);
        match self.engine.solve(ctx) {
            Ok(errors) if errors.is_empty() => run.solved = true,
            Ok(errors) => {
                warn!(count = errors.len(), "Solver reported errors");
                run.solver_errors = errors;
            }
            Err(e) => {
                // The case is already lost, but metrics are still worth reading.
                let failure = CaseError::new(CaseStage::Solve, e);
                warn!(error = %failure, "Solve call failed");
                run.notes.push(failure.to_string());
            }
        }

        // === EXTRACT ===
        run.enter(CaseStage::Extract);
        self.extract(study, &topology, run);
        Ok(())
    }

    fn add_unit(
        &mut self,
        ctx: ContextId,
        kind: UnitKind,
        position: Position,
        tag: &str,
        run: &mut CaseRun,
    ) -> Result<UnitHandle, CaseError> {
        let handle = self
            .engine
            .add_unit(ctx, kind, position, tag)
            .map_err(at(CaseStage::Topology))?;
        run.trace.units.push(handle.clone());
        Ok(handle)
    }

    fn connect(&mut self, ctx: ContextId, from: &UnitHandle, to: &UnitHandle) -> Result<(), CaseError> {
        self.engine
            .connect(ctx, from, to)
            .map_err(at(CaseStage::Topology))
    }

    fn build_topology(
        &mut self,
        ctx: ContextId,
        study: &StudyKind,
        run: &mut CaseRun,
    ) -> Result<Topology, CaseError> {
        let spec = study.feed();
        let feed = self.add_unit(ctx, UnitKind::MaterialStream, spec.position, &spec.name, run)?;
        match study {
            StudyKind::Reactor(_) => {
                let reactor = self.add_unit(ctx, UnitKind::PfrReactor, REACTOR_POSITION, REACTOR_TAG, run)?;
                let product = self.add_unit(ctx, UnitKind::MaterialStream, PRODUCT_POSITION, PRODUCT_TAG, run)?;
                let heat = self.add_unit(ctx, UnitKind::EnergyStream, HEAT_POSITION, HEAT_TAG, run)?;
                self.connect(ctx, &feed, &reactor)?;
                self.connect(ctx, &reactor, &product)?;
                self.connect(ctx, &heat, &reactor)?;
                Ok(Topology::Reactor {
                    feed,
                    reactor,
                    product,
                    heat,
                })
            }
            StudyKind::Distillation(_) => {
                let column = self.add_unit(ctx, UnitKind::ShortcutColumn, COLUMN_POSITION, COLUMN_TAG, run)?;
                let distillate =
                    self.add_unit(ctx, UnitKind::MaterialStream, DISTILLATE_POSITION, DISTILLATE_TAG, run)?;
                let bottoms = self.add_unit(ctx, UnitKind::MaterialStream, BOTTOMS_POSITION, BOTTOMS_TAG, run)?;
                let condenser =
                    self.add_unit(ctx, UnitKind::EnergyStream, CONDENSER_POSITION, CONDENSER_TAG, run)?;
                let reboiler = self.add_unit(ctx, UnitKind::EnergyStream, REBOILER_POSITION, REBOILER_TAG, run)?;
                self.connect(ctx, &feed, &column)?;
                self.connect(ctx, &column, &distillate)?;
                self.connect(ctx, &column, &bottoms)?;
                self.connect(ctx, &column, &condenser)?;
                self.connect(ctx, &reboiler, &column)?;
                Ok(Topology::Column {
                    feed,
                    column,
                    distillate,
                })
            }
        }
    }

    /// Registers the study's reaction in a reaction set and returns that set as a
    /// binding target.
    fn define_reaction(
        &mut self,
        ctx: ContextId,
        study: &ReactorStudy,
        run: &mut CaseRun,
    ) -> Result<BindingTarget, CaseError> {
        let stage = CaseStage::ReactionDefine;
        let reaction = self
            .engine
            .define_reaction(ctx, &study.reaction)
            .map_err(at(stage))?;

        let listed = self.engine.list_reaction_sets(ctx).map_err(at(stage))?;
        let (chosen, listed) = match listed.first() {
            Some(existing) => (existing.clone(), listed),
            None => {
                let created = self
                    .engine
                    .create_reaction_set(ctx, &study.reaction_set.name, &study.reaction_set.label)
                    .map_err(at(stage))?;
                let relisted = self.engine.list_reaction_sets(ctx).map_err(at(stage))?;
                (created, relisted)
            }
        };
        debug!(set = %chosen.id, "Using reaction set");

        self.engine
            .add_reaction_to_set(ctx, reaction, &chosen, true, 0)
            .map_err(at(stage))?;
        let target = BindingTarget::reaction_set(&listed, &chosen);
        run.trace.reaction_set = Some(chosen);
        Ok(target)
    }

    /// Writes a single property; a failure is logged and the write skipped.
    fn write_property(&mut self, unit: &UnitHandle, property: &str, value: PropertyValue) {
        if let Err(e) = self.engine.set_property(unit, property, value) {
            warn!(unit = %unit.tag(), property, error = %e, "Property write failed, skipping");
        }
    }

    fn extract(&self, study: &StudyKind, topology: &Topology, run: &mut CaseRun) {
        let engine: &dyn SimulationEngine = &*self.engine;
        let index_of = |compound: &str| study.compounds().iter().position(|c| c == compound);
        let missing = |compound: &str| EngineError::UnknownCompound(compound.to_string());

        match (study, topology) {
            (
                StudyKind::Reactor(s),
                Topology::Reactor {
                    feed,
                    product,
                    heat,
                    ..
                },
            ) => {
                let conversion = index_of(&s.limiting_reactant)
                    .ok_or_else(|| missing(&s.limiting_reactant))
                    .and_then(|i| {
                        let inlet = metrics::component_flow(engine, feed, i)?;
                        let outlet = metrics::component_flow(engine, product, i)?;
                        Ok(metrics::conversion(inlet, outlet))
                    });
                run.metrics.record(metrics::CONVERSION, conversion);

                let product_flow = index_of(&s.product)
                    .ok_or_else(|| missing(&s.product))
                    .and_then(|i| metrics::component_flow(engine, product, i));
                run.metrics
                    .record(metrics::outlet_flow(&s.product), product_flow);

                run.metrics.record(
                    metrics::OUTLET_TEMPERATURE,
                    metrics::read_number(engine, product, names::TEMPERATURE),
                );
                run.metrics.record(
                    metrics::HEAT_DUTY,
                    metrics::read_number(engine, heat, names::ENERGY_FLOW),
                );
            }
            (
                StudyKind::Distillation(s),
                Topology::Column {
                    column, distillate, ..
                },
            ) => {
                let purity = index_of(&s.light_key)
                    .ok_or_else(|| missing(&s.light_key))
                    .and_then(|i| metrics::composition_fraction(engine, distillate, i));
                run.metrics.record(metrics::DISTILLATE_PURITY, purity);
                run.metrics.record(
                    metrics::CONDENSER_DUTY,
                    metrics::read_number(engine, column, names::CONDENSER_DUTY),
                );
                run.metrics.record(
                    metrics::REBOILER_DUTY,
                    metrics::read_number(engine, column, names::REBOILER_DUTY),
                );
            }
            _ => warn!("Study and topology disagree, no metrics extracted"),
        }
        if run.metrics.placeholders() > 0 {
            debug!(placeholders = run.metrics.placeholders(), "Some metrics were unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::reference::{Fault, FaultPlan, ReferenceEngine};
    use crate::core::models::value::Scalar;
    use crate::engine::config::fixtures::{distillation_study, reactor_study};

    fn reactor_case(t: f64, v: f64) -> ParameterSet {
        [("Temperature_K", Scalar::Float(t)), ("Volume_m3", Scalar::Float(v))]
            .into_iter()
            .collect()
    }

    fn run_one(engine: &mut ReferenceEngine, study: &StudyKind, params: ParameterSet) -> CaseReport {
        CaseExecutor::new(engine).execute(study, params)
    }

    #[test]
    fn successful_reactor_case_records_every_metric() {
        let mut engine = ReferenceEngine::default();
        let study = reactor_study(&[300.0], &[2.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 2.0));

        let row = &report.row;
        assert!(row.success(), "error: {}", row.error());
        assert_eq!(row.error(), "");
        assert_eq!(row.case_type(), "PFR_Sweep");
        let names: Vec<&str> = row.metrics().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Conversion",
                "OutletFlow_Ethanol_mol_s",
                "OutletTemperature_K",
                "HeatDuty_kW"
            ]
        );
        let conversion = row.metric("Conversion").unwrap();
        assert!(conversion > 0.0 && conversion < 1.0);
        assert!((row.metric("OutletTemperature_K").unwrap() - 300.0).abs() < 1e-9);
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn reactor_case_walks_every_stage_in_order() {
        let mut engine = ReferenceEngine::default();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert_eq!(
            report.trace.stages,
            vec![
                CaseStage::Init,
                CaseStage::Compounds,
                CaseStage::Topology,
                CaseStage::ReactionDefine,
                CaseStage::ReactionBind,
                CaseStage::UnitConfigure,
                CaseStage::Solve,
                CaseStage::Extract,
                CaseStage::Record,
            ]
        );
        assert!(report.trace.binding.as_ref().unwrap().is_bound());
    }

    #[test]
    fn distillation_case_skips_reaction_stages() {
        let mut engine = ReferenceEngine::default();
        let study = distillation_study(&[2.0], &[15]);
        let params: ParameterSet = [("RefluxRatio", Scalar::Float(2.0)), ("Stages", Scalar::Int(15))]
            .into_iter()
            .collect();
        let report = run_one(&mut engine, &study, params);
        assert!(report.row.success(), "error: {}", report.row.error());
        assert!(!report.trace.stages.contains(&CaseStage::ReactionDefine));
        assert!((report.row.metric("DistillatePurity").unwrap() - 0.95).abs() < 1e-9);
        assert!(report.row.metric("CondenserDuty_kW").unwrap() < 0.0);
        assert!(report.row.metric("ReboilerDuty_kW").unwrap() > 0.0);
    }

    #[test]
    fn exhausted_binding_degrades_but_still_solves() {
        let mut engine = ReferenceEngine::builder()
            .reactor_binding_properties(Vec::<String>::new())
            .dynamic_attributes(false)
            .build();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert!(report.row.success());
        assert!(report.row.error().contains("reaction set binding exhausted"));
        assert!(!report.trace.binding.unwrap().is_bound());
    }

    #[test]
    fn solver_errors_fail_the_case_but_keep_placeholder_metrics() {
        let plan = FaultPlan::new().on_case(0, Fault::SolverErrors(vec!["did not converge".into()]));
        let mut engine = ReferenceEngine::builder().faults(plan).build();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert!(!report.row.success());
        assert_eq!(report.row.error(), "did not converge");
        assert_eq!(report.row.metrics().len(), 4);
        assert_eq!(report.row.metric("HeatDuty_kW"), Some(0.0));
        assert_eq!(report.trace.last_stage(), Some(CaseStage::Record));
    }

    #[test]
    fn raising_solve_is_recorded_and_extraction_still_runs() {
        let plan = FaultPlan::new().on_case(0, Fault::SolveRaises("engine crashed".into()));
        let mut engine = ReferenceEngine::builder().faults(plan).build();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert!(!report.row.success());
        assert!(report.row.error().contains("SOLVE failed"));
        assert!(report.row.error().contains("engine crashed"));
        assert!(report.trace.stages.contains(&CaseStage::Extract));
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn topology_failure_jumps_to_record_and_releases_context() {
        let plan = FaultPlan::new().on_case(0, Fault::FailTopology);
        let mut engine = ReferenceEngine::builder().faults(plan).build();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert!(!report.row.success());
        assert!(report.row.error().starts_with("TOPOLOGY failed"));
        assert!(report.row.metrics().is_empty());
        assert_eq!(
            report.trace.stages,
            vec![
                CaseStage::Init,
                CaseStage::Compounds,
                CaseStage::Topology,
                CaseStage::Record
            ]
        );
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn rejected_property_write_is_skipped_and_surfaces_in_solve() {
        let plan = FaultPlan::new().on_case(0, Fault::RejectProperty(names::VOLUME.to_string()));
        let mut engine = ReferenceEngine::builder().faults(plan).build();
        let study = reactor_study(&[300.0], &[1.0]);
        let report = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert!(!report.row.success());
        assert!(report.row.error().contains("volume"));
        assert!(report.trace.stages.contains(&CaseStage::Solve));
    }

    #[test]
    fn consecutive_cases_never_share_objects() {
        let mut engine = ReferenceEngine::default();
        let study = reactor_study(&[300.0], &[1.0]);
        let first = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        let second = run_one(&mut engine, &study, reactor_case(300.0, 1.0));
        assert_ne!(first.trace.context, second.trace.context);
        assert_ne!(first.trace.reaction_set, second.trace.reaction_set);
        for unit in &first.trace.units {
            assert!(second.trace.units.iter().all(|u| u.id() != unit.id()));
        }
    }
}
