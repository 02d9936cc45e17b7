//! An in-process engine implementing the adapter contract.
//!
//! The model is intentionally small (see [`solver`]) and exists so the orchestrator
//! can run end to end without an external simulator. Contexts, units and reactions
//! live in slot maps; a context owns every object created inside it and releasing
//! the context drops them all.
//!
//! Reactors expose a configurable subset of the reaction-set binding surfaces so that
//! the fallback behavior of the binding resolver can be exercised, and a
//! [`FaultPlan`] can make individual contexts misbehave.

pub mod catalog;
pub mod faults;
mod solver;

pub use faults::{Fault, FaultPlan};
pub use solver::MODE_ISOTHERMAL;

use super::error::EngineError;
use super::{EngineProvider, PropertyAccess, SimulationEngine};
use crate::core::models::ids::{ContextId, ReactionId, UnitId};
use crate::core::models::property::{PropertyValue, names};
use crate::core::models::reaction::{ReactionDefinition, ReactionSetRef};
use crate::core::models::stream::Position;
use crate::core::models::unit::{Capabilities, UnitHandle, UnitKind};
use slotmap::SlotMap;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

pub const BACKEND_NAME: &str = "reference";
pub const DEFAULT_REACTION_SET_ID: &str = "DefaultSet";
pub const DEFAULT_REACTION_SET_NAME: &str = "Default Set";

#[derive(Debug, Clone)]
struct UnitRecord {
    context: ContextId,
    kind: UnitKind,
    tag: String,
    exposed: BTreeSet<String>,
    dynamic_attributes: bool,
    properties: HashMap<String, PropertyValue>,
    attributes: HashMap<String, PropertyValue>,
}

impl UnitRecord {
    fn number(&self, name: &str) -> Option<f64> {
        self.properties.get(name).and_then(PropertyValue::as_f64)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_text)
    }

    fn vector(&self, name: &str) -> Option<&[f64]> {
        self.properties.get(name).and_then(PropertyValue::as_vector)
    }

    /// Doubles the molar flow and reverses the composition of a solved stream.
    fn scramble(&mut self) {
        if let Some(flow) = self.number(names::MOLAR_FLOW) {
            self.properties
                .insert(names::MOLAR_FLOW.to_string(), PropertyValue::Number(flow * 2.0));
        }
        if let Some(fractions) = self.vector(names::COMPOSITION) {
            let reversed: Vec<f64> = fractions.iter().rev().copied().collect();
            self.properties
                .insert(names::COMPOSITION.to_string(), PropertyValue::Vector(reversed));
        }
    }

    fn handle(&self, id: UnitId) -> UnitHandle {
        let capabilities = Capabilities::new(self.exposed.iter().cloned())
            .with_dynamic_attributes(self.dynamic_attributes);
        UnitHandle::new(id, self.context, self.kind, self.tag.clone(), capabilities)
    }
}

#[derive(Debug, Clone)]
struct ReactionRecord {
    context: ContextId,
    definition: ReactionDefinition,
}

#[derive(Debug, Clone)]
struct SetMember {
    reaction: ReactionId,
    enabled: bool,
    order: u32,
}

#[derive(Debug, Clone)]
struct ReactionSetRecord {
    id: String,
    name: String,
    members: Vec<SetMember>,
}

impl ReactionSetRecord {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Flowsheet {
    compounds: Vec<String>,
    units: Vec<UnitId>,
    connections: Vec<(UnitId, UnitId)>,
    reaction_sets: Vec<ReactionSetRecord>,
    faults: Vec<Fault>,
}

impl Flowsheet {
    fn new(faults: Vec<Fault>) -> Self {
        Self {
            compounds: Vec::new(),
            units: Vec::new(),
            connections: Vec::new(),
            reaction_sets: vec![ReactionSetRecord::new(
                DEFAULT_REACTION_SET_ID,
                DEFAULT_REACTION_SET_NAME,
            )],
            faults,
        }
    }

    fn rejects(&self, property: &str) -> bool {
        self.faults
            .iter()
            .any(|f| matches!(f, Fault::RejectProperty(p) if p == property))
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }
}

/// Builder for [`ReferenceEngine`].
#[derive(Debug, Clone)]
pub struct ReferenceEngineBuilder {
    reactor_binding: Vec<String>,
    dynamic_attributes: bool,
    faults: FaultPlan,
}

impl Default for ReferenceEngineBuilder {
    fn default() -> Self {
        Self {
            reactor_binding: vec![names::REACTION_SET_ID.to_string()],
            dynamic_attributes: true,
            faults: FaultPlan::default(),
        }
    }
}

impl ReferenceEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets which reaction-set binding properties reactors expose. Only the names
    /// [`names::REACTION_SET_INDEX`], [`names::REACTION_SET_INDEX_COMPACT`] and
    /// [`names::REACTION_SET_ID`] have an effect on the solve.
    pub fn reactor_binding_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reactor_binding = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Whether reactors accept dynamic attribute writes.
    pub fn dynamic_attributes(mut self, enabled: bool) -> Self {
        self.dynamic_attributes = enabled;
        self
    }

    pub fn faults(mut self, plan: FaultPlan) -> Self {
        self.faults = plan;
        self
    }

    pub fn build(self) -> ReferenceEngine {
        ReferenceEngine {
            contexts: SlotMap::with_key(),
            units: SlotMap::with_key(),
            reactions: SlotMap::with_key(),
            contexts_created: 0,
            reactor_binding: self.reactor_binding,
            dynamic_attributes: self.dynamic_attributes,
            faults: self.faults,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    contexts: SlotMap<ContextId, Flowsheet>,
    units: SlotMap<UnitId, UnitRecord>,
    reactions: SlotMap<ReactionId, ReactionRecord>,
    contexts_created: usize,
    reactor_binding: Vec<String>,
    dynamic_attributes: bool,
    faults: FaultPlan,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        ReferenceEngineBuilder::default().build()
    }
}

enum ValueKind {
    Number,
    Integer,
    Text,
    Vector,
}

fn value_kind(property: &str) -> ValueKind {
    match property {
        names::COMPOSITION => ValueKind::Vector,
        names::OPERATION_MODE
        | names::REACTION_SET_INDEX
        | names::REACTION_SET_INDEX_COMPACT => ValueKind::Integer,
        names::REACTION_SET_ID | names::LIGHT_KEY | names::HEAVY_KEY => ValueKind::Text,
        _ => ValueKind::Number,
    }
}

/// How many connections of the given direction a unit of `kind` accepts towards a
/// peer of `peer` kind.
fn port_capacity(kind: UnitKind, peer: UnitKind, outgoing: bool) -> usize {
    use UnitKind::*;
    match (kind, outgoing, peer) {
        (MaterialStream | EnergyStream, _, _) => 1,
        (PfrReactor, false, MaterialStream | EnergyStream) => 1,
        (PfrReactor, true, MaterialStream) => 1,
        (ShortcutColumn, false, MaterialStream | EnergyStream) => 1,
        (ShortcutColumn, true, MaterialStream) => 2,
        (ShortcutColumn, true, EnergyStream) => 1,
        _ => 0,
    }
}

impl ReferenceEngine {
    pub fn builder() -> ReferenceEngineBuilder {
        ReferenceEngineBuilder::new()
    }

    /// Number of contexts that have been created and not yet released.
    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn contexts_created(&self) -> usize {
        self.contexts_created
    }

    fn flowsheet(&self, ctx: ContextId) -> Result<&Flowsheet, EngineError> {
        self.contexts.get(ctx).ok_or(EngineError::ContextNotFound)
    }

    fn flowsheet_mut(&mut self, ctx: ContextId) -> Result<&mut Flowsheet, EngineError> {
        self.contexts.get_mut(ctx).ok_or(EngineError::ContextNotFound)
    }

    fn unit_record(&self, handle: &UnitHandle) -> Result<&UnitRecord, EngineError> {
        self.flowsheet(handle.context())?;
        self.units
            .get(handle.id())
            .filter(|u| u.context == handle.context())
            .ok_or_else(|| EngineError::UnitNotFound {
                tag: handle.tag().to_string(),
            })
    }

    fn exposed_properties(&self, kind: UnitKind) -> BTreeSet<String> {
        let mut exposed: BTreeSet<String> = catalog::base_properties(kind)
            .iter()
            .map(|p| p.to_string())
            .collect();
        if kind == UnitKind::PfrReactor {
            exposed.extend(self.reactor_binding.iter().cloned());
        }
        exposed
    }

    fn used_ports(
        &self,
        flowsheet: &Flowsheet,
        unit: UnitId,
        kind: UnitKind,
        peer: UnitKind,
        outgoing: bool,
    ) -> usize {
        flowsheet
            .connections
            .iter()
            .filter_map(|&(from, to)| match outgoing {
                true if from == unit => Some(to),
                false if to == unit => Some(from),
                _ => None,
            })
            .filter(|other| {
                kind.is_stream() || self.units.get(*other).is_some_and(|u| u.kind == peer)
            })
            .count()
    }

    fn normalize(
        &self,
        flowsheet: &Flowsheet,
        unit: &UnitRecord,
        property: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue, EngineError> {
        let invalid = |expected: &'static str, value: &PropertyValue| EngineError::InvalidValue {
            unit: unit.tag.clone(),
            property: property.to_string(),
            expected,
            found: value.kind_name(),
        };
        let normalized = match value_kind(property) {
            ValueKind::Number => value
                .as_f64()
                .map(PropertyValue::Number)
                .ok_or_else(|| invalid("number", &value))?,
            ValueKind::Integer => value
                .as_f64()
                .filter(|v| v.fract() == 0.0)
                .map(|v| PropertyValue::Integer(v as i64))
                .ok_or_else(|| invalid("integer", &value))?,
            ValueKind::Text => match value {
                PropertyValue::Text(_) => value,
                other => return Err(invalid("text", &other)),
            },
            ValueKind::Vector => match value {
                PropertyValue::Vector(ref v) if v.len() == flowsheet.compounds.len() => value,
                PropertyValue::Vector(_) => {
                    return Err(invalid("one mole fraction per compound", &value));
                }
                other => return Err(invalid("vector", &other)),
            },
        };

        match property {
            names::REACTION_SET_INDEX | names::REACTION_SET_INDEX_COMPACT => {
                let index = normalized.as_f64().unwrap_or(-1.0);
                if index < 0.0 || index as usize >= flowsheet.reaction_sets.len() {
                    return Err(EngineError::ReactionSetNotFound(format!("#{}", normalized)));
                }
            }
            names::REACTION_SET_ID => {
                let id = normalized.as_text().unwrap_or_default();
                if !flowsheet.reaction_sets.iter().any(|s| s.id == id) {
                    return Err(EngineError::ReactionSetNotFound(id.to_string()));
                }
            }
            _ => {}
        }
        Ok(normalized)
    }

    fn find_set_mut<'a>(
        flowsheet: &'a mut Flowsheet,
        id: &str,
    ) -> Result<&'a mut ReactionSetRecord, EngineError> {
        flowsheet
            .reaction_sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| EngineError::ReactionSetNotFound(id.to_string()))
    }
}

impl PropertyAccess for ReferenceEngine {
    fn set_property(
        &mut self,
        unit: &UnitHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), EngineError> {
        let property = catalog::canonical_property(name);
        let record = self.unit_record(unit)?;
        let flowsheet = self.flowsheet(unit.context())?;
        if flowsheet.rejects(property) || !record.exposed.contains(property) {
            return Err(EngineError::PropertyNotFound {
                unit: record.tag.clone(),
                property: name.to_string(),
            });
        }
        let normalized = self.normalize(flowsheet, record, property, value)?;
        trace!(unit = %unit.tag(), property, value = %normalized, "Property written");
        if let Some(record) = self.units.get_mut(unit.id()) {
            record.properties.insert(property.to_string(), normalized);
        }
        Ok(())
    }

    fn get_property(&self, unit: &UnitHandle, name: &str) -> Result<PropertyValue, EngineError> {
        let property = catalog::canonical_property(name);
        let record = self.unit_record(unit)?;
        if !record.exposed.contains(property) {
            return Err(EngineError::PropertyNotFound {
                unit: record.tag.clone(),
                property: name.to_string(),
            });
        }
        record
            .properties
            .get(property)
            .cloned()
            .ok_or_else(|| EngineError::PropertyUnset {
                unit: record.tag.clone(),
                property: name.to_string(),
            })
    }

    fn set_attribute(
        &mut self,
        unit: &UnitHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), EngineError> {
        let record = self.unit_record(unit)?;
        if !record.dynamic_attributes {
            return Err(EngineError::CallFailed {
                call: "set_attribute",
                message: format!("'{}' does not accept dynamic attributes", record.tag),
            });
        }
        if let Some(record) = self.units.get_mut(unit.id()) {
            record.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }
}

impl SimulationEngine for ReferenceEngine {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn create_context(&mut self) -> Result<ContextId, EngineError> {
        let ordinal = self.contexts_created;
        self.contexts_created += 1;
        let faults = self.faults.for_case(ordinal).to_vec();
        let ctx = self.contexts.insert(Flowsheet::new(faults));
        debug!(ordinal, "Created simulation context");
        Ok(ctx)
    }

    fn release_context(&mut self, ctx: ContextId) -> Result<(), EngineError> {
        self.contexts
            .remove(ctx)
            .ok_or(EngineError::ContextNotFound)?;
        self.units.retain(|_, u| u.context != ctx);
        self.reactions.retain(|_, r| r.context != ctx);
        Ok(())
    }

    fn add_compound(&mut self, ctx: ContextId, name: &str) -> Result<(), EngineError> {
        let flowsheet = self.flowsheet_mut(ctx)?;
        if catalog::compound(name).is_none() {
            return Err(EngineError::UnknownCompound(name.to_string()));
        }
        if flowsheet.compounds.iter().any(|c| c == name) {
            return Err(EngineError::DuplicateDefinition {
                kind: "Compound",
                name: name.to_string(),
            });
        }
        flowsheet.compounds.push(name.to_string());
        Ok(())
    }

    fn add_unit(
        &mut self,
        ctx: ContextId,
        kind: UnitKind,
        position: Position,
        tag: &str,
    ) -> Result<UnitHandle, EngineError> {
        let flowsheet = self.flowsheet(ctx)?;
        if flowsheet
            .units
            .iter()
            .any(|id| self.units.get(*id).is_some_and(|u| u.tag == tag))
        {
            return Err(EngineError::DuplicateDefinition {
                kind: "Unit",
                name: tag.to_string(),
            });
        }
        let record = UnitRecord {
            context: ctx,
            kind,
            tag: tag.to_string(),
            exposed: self.exposed_properties(kind),
            dynamic_attributes: self.dynamic_attributes && kind == UnitKind::PfrReactor,
            properties: HashMap::new(),
            attributes: HashMap::new(),
        };
        let id = self.units.insert(record);
        self.flowsheet_mut(ctx)?.units.push(id);
        trace!(%kind, tag, x = position.x, y = position.y, "Unit added");
        self.units
            .get(id)
            .map(|r| r.handle(id))
            .ok_or(EngineError::UnitNotFound {
                tag: tag.to_string(),
            })
    }

    fn connect(
        &mut self,
        ctx: ContextId,
        from: &UnitHandle,
        to: &UnitHandle,
    ) -> Result<(), EngineError> {
        let from_record = self.unit_record(from)?;
        let to_record = self.unit_record(to)?;
        let flowsheet = self.flowsheet(ctx)?;
        let refuse = |reason: String| EngineError::Connection {
            from: from.tag().to_string(),
            to: to.tag().to_string(),
            reason,
        };
        if from.context() != ctx || to.context() != ctx {
            return Err(refuse("objects belong to a different context".to_string()));
        }
        if flowsheet.has_fault(&Fault::FailTopology) {
            return Err(refuse("connection rejected by the flowsheet".to_string()));
        }
        if from_record.kind.is_stream() == to_record.kind.is_stream() {
            return Err(refuse(
                "a stream must sit between two unit operations".to_string(),
            ));
        }
        let (from_kind, to_kind) = (from_record.kind, to_record.kind);
        let out_used = self.used_ports(flowsheet, from.id(), from_kind, to_kind, true);
        if out_used >= port_capacity(from_kind, to_kind, true) {
            return Err(refuse(format!("'{}' has no free outlet port", from.tag())));
        }
        let in_used = self.used_ports(flowsheet, to.id(), to_kind, from_kind, false);
        if in_used >= port_capacity(to_kind, from_kind, false) {
            return Err(refuse(format!("'{}' has no free inlet port", to.tag())));
        }
        self.flowsheet_mut(ctx)?
            .connections
            .push((from.id(), to.id()));
        Ok(())
    }

    fn define_reaction(
        &mut self,
        ctx: ContextId,
        definition: &ReactionDefinition,
    ) -> Result<ReactionId, EngineError> {
        let flowsheet = self.flowsheet(ctx)?;
        if let Some(missing) = definition
            .compounds()
            .find(|c| !flowsheet.compounds.iter().any(|known| known == c))
        {
            return Err(EngineError::UnknownCompound(missing.to_string()));
        }
        if self
            .reactions
            .values()
            .any(|r| r.context == ctx && r.definition.name == definition.name)
        {
            return Err(EngineError::DuplicateDefinition {
                kind: "Reaction",
                name: definition.name.clone(),
            });
        }
        Ok(self.reactions.insert(ReactionRecord {
            context: ctx,
            definition: definition.clone(),
        }))
    }

    fn list_reaction_sets(&self, ctx: ContextId) -> Result<Vec<ReactionSetRef>, EngineError> {
        Ok(self
            .flowsheet(ctx)?
            .reaction_sets
            .iter()
            .map(|s| ReactionSetRef {
                context: ctx,
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect())
    }

    fn create_reaction_set(
        &mut self,
        ctx: ContextId,
        name: &str,
        label: &str,
    ) -> Result<ReactionSetRef, EngineError> {
        let flowsheet = self.flowsheet_mut(ctx)?;
        if flowsheet.reaction_sets.iter().any(|s| s.id == name) {
            return Err(EngineError::DuplicateDefinition {
                kind: "Reaction set",
                name: name.to_string(),
            });
        }
        let display = if label.is_empty() { name } else { label };
        flowsheet
            .reaction_sets
            .push(ReactionSetRecord::new(name, display));
        Ok(ReactionSetRef {
            context: ctx,
            id: name.to_string(),
            name: display.to_string(),
        })
    }

    fn add_reaction_to_set(
        &mut self,
        ctx: ContextId,
        reaction: ReactionId,
        set: &ReactionSetRef,
        enabled: bool,
        order: u32,
    ) -> Result<(), EngineError> {
        if set.context != ctx {
            return Err(EngineError::ReactionSetNotFound(set.id.clone()));
        }
        let known = self
            .reactions
            .get(reaction)
            .is_some_and(|r| r.context == ctx);
        if !known {
            return Err(EngineError::CallFailed {
                call: "add_reaction_to_set",
                message: "reaction is not defined in this context".to_string(),
            });
        }
        let flowsheet = self.flowsheet_mut(ctx)?;
        let target = Self::find_set_mut(flowsheet, &set.id)?;
        target.members.retain(|m| m.reaction != reaction);
        target.members.push(SetMember {
            reaction,
            enabled,
            order,
        });
        Ok(())
    }

    fn solve(&mut self, ctx: ContextId) -> Result<Vec<String>, EngineError> {
        let flowsheet = self.flowsheet(ctx)?;
        for fault in &flowsheet.faults {
            match fault {
                Fault::SolveRaises(message) => {
                    return Err(EngineError::CallFailed {
                        call: "solve",
                        message: message.clone(),
                    });
                }
                Fault::SolverErrors(messages) => return Ok(messages.clone()),
                _ => {}
            }
        }

        let mut errors = Vec::new();
        let mut writes = Vec::new();
        for &id in &flowsheet.units {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let outcome = match unit.kind {
                UnitKind::PfrReactor => solver::solve_pfr(flowsheet, &self.units, &self.reactions, id),
                UnitKind::ShortcutColumn => solver::solve_column(flowsheet, &self.units, id),
                UnitKind::MaterialStream | UnitKind::EnergyStream => continue,
            };
            match outcome {
                Ok(unit_writes) => writes.extend(unit_writes),
                Err(message) => errors.push(message),
            }
        }
        let corrupted = if flowsheet.has_fault(&Fault::CorruptState) {
            flowsheet.units.clone()
        } else {
            Vec::new()
        };

        for write in writes {
            if let Some(record) = self.units.get_mut(write.unit) {
                record
                    .properties
                    .insert(write.property.to_string(), write.value);
            }
        }
        if !corrupted.is_empty() {
            for id in corrupted {
                if let Some(record) = self
                    .units
                    .get_mut(id)
                    .filter(|r| r.kind == UnitKind::MaterialStream)
                {
                    record.scramble();
                }
            }
            self.flowsheet_mut(ctx)?
                .reaction_sets
                .insert(0, ReactionSetRecord::new("Leaked", "Leaked Set"));
            debug!("Context state corrupted after solve");
        }
        debug!(errors = errors.len(), "Flowsheet solved");
        Ok(errors)
    }
}

/// Hands out fresh [`ReferenceEngine`] instances built from a template builder.
#[derive(Debug, Clone, Default)]
pub struct ReferenceEngineProvider {
    builder: ReferenceEngineBuilder,
}

impl ReferenceEngineProvider {
    pub fn new(builder: ReferenceEngineBuilder) -> Self {
        Self { builder }
    }
}

impl EngineProvider for ReferenceEngineProvider {
    fn backend(&self) -> &str {
        BACKEND_NAME
    }

    fn connect(&self) -> Result<Box<dyn SimulationEngine>, EngineError> {
        Ok(Box::new(self.builder.clone().build()))
    }
}
