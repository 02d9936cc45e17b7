//! Resolves a configuration intent against an engine that may expose it through any
//! one of several surfaces.
//!
//! A resolver owns an ordered list of [`BindingStrategy`] values. Each strategy is
//! probed against the unit's advertised capabilities and, if applicable, applied.
//! The first strategy whose write succeeds wins; failures are recorded and the next
//! strategy is tried. Running out of strategies is reported as
//! [`BindingOutcome::Exhausted`], never as an error, so the caller decides how much a
//! missing binding matters.

use crate::adapter::PropertyAccess;
use crate::core::models::property::{PropertyValue, names};
use crate::core::models::reaction::ReactionSetRef;
use crate::core::models::unit::UnitHandle;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMechanism {
    /// A numeric property holding the target's position in the engine's list.
    IndexedProperty(&'static str),
    /// A text property holding the target's identifier.
    IdentifierProperty(&'static str),
    /// A free-form attribute holding the target's identifier.
    DynamicAttribute(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingStrategy {
    pub name: &'static str,
    pub mechanism: BindingMechanism,
}

pub const REACTION_SET_STRATEGIES: [BindingStrategy; 4] = [
    BindingStrategy {
        name: "indexed property 'Reaction Set'",
        mechanism: BindingMechanism::IndexedProperty(names::REACTION_SET_INDEX),
    },
    BindingStrategy {
        name: "indexed property 'ReactionSet'",
        mechanism: BindingMechanism::IndexedProperty(names::REACTION_SET_INDEX_COMPACT),
    },
    BindingStrategy {
        name: "identifier property 'ReactionSetID'",
        mechanism: BindingMechanism::IdentifierProperty(names::REACTION_SET_ID),
    },
    BindingStrategy {
        name: "dynamic attribute 'ReactionSet'",
        mechanism: BindingMechanism::DynamicAttribute(names::REACTION_SET_ATTRIBUTE),
    },
];

/// The object being bound, in every form a strategy might need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTarget {
    pub index: Option<usize>,
    pub identifier: String,
}

impl BindingTarget {
    pub fn new(index: Option<usize>, identifier: impl Into<String>) -> Self {
        Self {
            index,
            identifier: identifier.into(),
        }
    }

    /// Targets `chosen`, taking its index from its position in `listed`.
    pub fn reaction_set(listed: &[ReactionSetRef], chosen: &ReactionSetRef) -> Self {
        Self {
            index: listed.iter().position(|s| s == chosen),
            identifier: chosen.id.clone(),
        }
    }
}

impl BindingStrategy {
    /// Checks whether this strategy can apply to `unit` at all.
    pub fn probe(&self, unit: &UnitHandle) -> Result<(), String> {
        match self.mechanism {
            BindingMechanism::IndexedProperty(property)
            | BindingMechanism::IdentifierProperty(property) => {
                if unit.supports(property) {
                    Ok(())
                } else {
                    Err(format!("'{}' does not expose '{}'", unit.tag(), property))
                }
            }
            BindingMechanism::DynamicAttribute(_) => {
                if unit.capabilities().accepts_dynamic_attributes() {
                    Ok(())
                } else {
                    Err(format!("'{}' does not accept dynamic attributes", unit.tag()))
                }
            }
        }
    }

    fn value_for(&self, target: &BindingTarget) -> Result<PropertyValue, String> {
        match self.mechanism {
            BindingMechanism::IndexedProperty(_) => target
                .index
                .map(|i| PropertyValue::Integer(i as i64))
                .ok_or_else(|| format!("'{}' has no index in the engine's list", target.identifier)),
            BindingMechanism::IdentifierProperty(_) | BindingMechanism::DynamicAttribute(_) => {
                if target.identifier.is_empty() {
                    Err("target identifier is empty".to_string())
                } else {
                    Ok(PropertyValue::Text(target.identifier.clone()))
                }
            }
        }
    }

    fn apply<P: PropertyAccess + ?Sized>(
        &self,
        engine: &mut P,
        unit: &UnitHandle,
        target: &BindingTarget,
    ) -> Result<Verification, String> {
        self.probe(unit)?;
        let value = self.value_for(target)?;
        match self.mechanism {
            BindingMechanism::IndexedProperty(property)
            | BindingMechanism::IdentifierProperty(property) => {
                engine
                    .set_property(unit, property, value.clone())
                    .map_err(|e| e.to_string())?;
                Ok(match engine.get_property(unit, property) {
                    Ok(read) if read.same_as(&value) => Verification::Confirmed,
                    Ok(read) => Verification::Mismatch {
                        written: value,
                        read,
                    },
                    Err(e) => {
                        debug!(property, error = %e, "Binding read-back unavailable");
                        Verification::Unverified
                    }
                })
            }
            BindingMechanism::DynamicAttribute(attribute) => {
                engine
                    .set_attribute(unit, attribute, value)
                    .map_err(|e| e.to_string())?;
                Ok(Verification::Unverified)
            }
        }
    }
}

/// Result of reading a binding back after it was written.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Confirmed,
    Mismatch {
        written: PropertyValue,
        read: PropertyValue,
    },
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingOutcome {
    Bound {
        strategy: &'static str,
        verification: Verification,
        attempts: Vec<StrategyAttempt>,
    },
    Exhausted {
        attempts: Vec<StrategyAttempt>,
    },
}

impl BindingOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, BindingOutcome::Bound { .. })
    }

    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            BindingOutcome::Bound { strategy, .. } => Some(*strategy),
            BindingOutcome::Exhausted { .. } => None,
        }
    }

    /// Strategies that were tried and failed, in the order they were tried.
    pub fn attempts(&self) -> &[StrategyAttempt] {
        match self {
            BindingOutcome::Bound { attempts, .. } | BindingOutcome::Exhausted { attempts } => {
                attempts
            }
        }
    }

    /// Text for the case's error field when the binding degraded the case.
    pub fn note(&self, intent: &str) -> Option<String> {
        match self {
            BindingOutcome::Bound {
                strategy,
                verification: Verification::Mismatch { written, read },
                ..
            } => Some(format!(
                "{} bound via {} but read back {} instead of {}",
                intent, strategy, read, written
            )),
            BindingOutcome::Bound { .. } => None,
            BindingOutcome::Exhausted { attempts } => {
                let tried: Vec<String> = attempts
                    .iter()
                    .map(|a| format!("{} ({})", a.strategy, a.reason))
                    .collect();
                Some(format!("{} binding exhausted: {}", intent, tried.join("; ")))
            }
        }
    }
}

impl fmt::Display for BindingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOutcome::Bound { strategy, .. } => write!(f, "bound via {}", strategy),
            BindingOutcome::Exhausted { attempts } => {
                write!(f, "exhausted after {} strategies", attempts.len())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyBindingResolver {
    intent: &'static str,
    strategies: Vec<BindingStrategy>,
}

impl PropertyBindingResolver {
    pub fn new(intent: &'static str, strategies: Vec<BindingStrategy>) -> Self {
        Self { intent, strategies }
    }

    /// The resolver for associating a reactor with a reaction set.
    pub fn reaction_set() -> Self {
        Self::new("reaction set", REACTION_SET_STRATEGIES.to_vec())
    }

    pub fn intent(&self) -> &'static str {
        self.intent
    }

    pub fn strategies(&self) -> &[BindingStrategy] {
        &self.strategies
    }

    /// Strategies whose probe passes for `unit`, in priority order.
    pub fn applicable(&self, unit: &UnitHandle) -> Vec<&BindingStrategy> {
        self.strategies
            .iter()
            .filter(|s| s.probe(unit).is_ok())
            .collect()
    }

    pub fn resolve<P: PropertyAccess + ?Sized>(
        &self,
        engine: &mut P,
        unit: &UnitHandle,
        target: &BindingTarget,
    ) -> BindingOutcome {
        let mut attempts = Vec::new();
        for strategy in &self.strategies {
            match strategy.apply(engine, unit, target) {
                Ok(verification) => {
                    if let Verification::Mismatch { written, read } = &verification {
                        warn!(
                            unit = %unit.tag(),
                            strategy = strategy.name,
                            %written,
                            %read,
                            "Binding read-back does not match the written value"
                        );
                    }
                    debug!(unit = %unit.tag(), strategy = strategy.name, intent = self.intent, "Binding resolved");
                    return BindingOutcome::Bound {
                        strategy: strategy.name,
                        verification,
                        attempts,
                    };
                }
                Err(reason) => {
                    debug!(unit = %unit.tag(), strategy = strategy.name, %reason, "Binding strategy failed");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name,
                        reason,
                    });
                }
            }
        }
        BindingOutcome::Exhausted { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::error::EngineError;
    use crate::core::models::ids::{ContextId, UnitId};
    use crate::core::models::unit::{Capabilities, UnitKind};
    use slotmap::KeyData;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeUnit {
        properties: HashMap<String, PropertyValue>,
        attributes: HashMap<String, PropertyValue>,
        rejected: Vec<&'static str>,
        /// Value returned by every read instead of the stored one.
        read_override: Option<PropertyValue>,
        unreadable: bool,
    }

    impl PropertyAccess for FakeUnit {
        fn set_property(
            &mut self,
            unit: &UnitHandle,
            name: &str,
            value: PropertyValue,
        ) -> Result<(), EngineError> {
            if self.rejected.iter().any(|r| *r == name) {
                return Err(EngineError::CallFailed {
                    call: "set_property",
                    message: format!("{} refused", name),
                });
            }
            if !unit.supports(name) {
                return Err(EngineError::PropertyNotFound {
                    unit: unit.tag().to_string(),
                    property: name.to_string(),
                });
            }
            self.properties.insert(name.to_string(), value);
            Ok(())
        }

        fn get_property(&self, unit: &UnitHandle, name: &str) -> Result<PropertyValue, EngineError> {
            if self.unreadable {
                return Err(EngineError::PropertyUnset {
                    unit: unit.tag().to_string(),
                    property: name.to_string(),
                });
            }
            if let Some(value) = &self.read_override {
                return Ok(value.clone());
            }
            self.properties
                .get(name)
                .cloned()
                .ok_or_else(|| EngineError::PropertyUnset {
                    unit: unit.tag().to_string(),
                    property: name.to_string(),
                })
        }

        fn set_attribute(
            &mut self,
            _unit: &UnitHandle,
            name: &str,
            value: PropertyValue,
        ) -> Result<(), EngineError> {
            self.attributes.insert(name.to_string(), value);
            Ok(())
        }
    }

    fn reactor(properties: &[&str], dynamic: bool) -> UnitHandle {
        UnitHandle::new(
            UnitId::from(KeyData::from_ffi(1)),
            ContextId::from(KeyData::from_ffi(1)),
            UnitKind::PfrReactor,
            "PFR-1",
            Capabilities::new(properties.iter().copied()).with_dynamic_attributes(dynamic),
        )
    }

    fn target() -> BindingTarget {
        BindingTarget::new(Some(0), "Set-1")
    }

    #[test]
    fn first_strategy_wins_when_every_surface_is_available() {
        let unit = reactor(&["Reaction Set", "ReactionSet", "ReactionSetID"], true);
        let mut engine = FakeUnit::default();
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert_eq!(outcome.strategy(), Some(REACTION_SET_STRATEGIES[0].name));
        assert!(outcome.attempts().is_empty());
        assert_eq!(
            engine.properties.get("Reaction Set"),
            Some(&PropertyValue::Integer(0))
        );
        assert!(matches!(
            outcome,
            BindingOutcome::Bound {
                verification: Verification::Confirmed,
                ..
            }
        ));
    }

    #[test]
    fn falls_through_to_identifier_property() {
        let unit = reactor(&["ReactionSetID"], true);
        let mut engine = FakeUnit::default();
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert_eq!(outcome.strategy(), Some(REACTION_SET_STRATEGIES[2].name));
        assert_eq!(outcome.attempts().len(), 2);
        assert_eq!(
            engine.properties.get("ReactionSetID"),
            Some(&PropertyValue::Text("Set-1".to_string()))
        );
    }

    #[test]
    fn failed_write_moves_on_to_next_strategy() {
        let unit = reactor(&["Reaction Set", "ReactionSetID"], false);
        let mut engine = FakeUnit {
            rejected: vec!["Reaction Set"],
            ..Default::default()
        };
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert_eq!(outcome.strategy(), Some(REACTION_SET_STRATEGIES[2].name));
        assert!(outcome.attempts()[0].reason.contains("refused"));
    }

    #[test]
    fn dynamic_attribute_is_last_resort_and_unverified() {
        let unit = reactor(&[], true);
        let mut engine = FakeUnit::default();
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert!(matches!(
            outcome,
            BindingOutcome::Bound {
                verification: Verification::Unverified,
                ..
            }
        ));
        assert_eq!(outcome.attempts().len(), 3);
        assert!(engine.attributes.contains_key("ReactionSet"));
        assert_eq!(outcome.note("reaction set"), None);
    }

    #[test]
    fn no_surface_exhausts_with_every_reason() {
        let unit = reactor(&["Volume"], false);
        let mut engine = FakeUnit::default();
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert!(!outcome.is_bound());
        assert_eq!(outcome.attempts().len(), 4);
        let note = outcome.note("reaction set").unwrap();
        assert!(note.starts_with("reaction set binding exhausted"));
        assert!(note.contains("dynamic attribute 'ReactionSet'"));
    }

    #[test]
    fn mismatched_read_back_still_wins_but_leaves_a_note() {
        let unit = reactor(&["Reaction Set"], false);
        let mut engine = FakeUnit {
            read_override: Some(PropertyValue::Integer(3)),
            ..Default::default()
        };
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert_eq!(outcome.strategy(), Some(REACTION_SET_STRATEGIES[0].name));
        let note = outcome.note("reaction set").unwrap();
        assert!(note.contains("read back 3 instead of 0"));
    }

    #[test]
    fn unreadable_property_is_unverified() {
        let unit = reactor(&["ReactionSetID"], false);
        let mut engine = FakeUnit {
            unreadable: true,
            ..Default::default()
        };
        let outcome = PropertyBindingResolver::reaction_set().resolve(&mut engine, &unit, &target());
        assert!(matches!(
            outcome,
            BindingOutcome::Bound {
                verification: Verification::Unverified,
                ..
            }
        ));
    }

    #[test]
    fn indexed_strategy_needs_an_index() {
        let unit = reactor(&["Reaction Set", "ReactionSetID"], false);
        let mut engine = FakeUnit::default();
        let outcome = PropertyBindingResolver::reaction_set().resolve(
            &mut engine,
            &unit,
            &BindingTarget::new(None, "Set-1"),
        );
        assert_eq!(outcome.strategy(), Some(REACTION_SET_STRATEGIES[2].name));
    }

    #[test]
    fn same_capabilities_select_same_strategy() {
        let resolver = PropertyBindingResolver::reaction_set();
        let winners: Vec<_> = (0..5)
            .map(|_| {
                let unit = reactor(&["ReactionSet", "ReactionSetID"], true);
                let mut engine = FakeUnit::default();
                resolver.resolve(&mut engine, &unit, &target()).strategy()
            })
            .collect();
        assert!(winners.iter().all(|w| *w == Some(REACTION_SET_STRATEGIES[1].name)));
        let unit = reactor(&["ReactionSet", "ReactionSetID"], true);
        assert_eq!(resolver.applicable(&unit).len(), 3);
    }

    #[test]
    fn target_index_follows_list_position() {
        let ctx = ContextId::from(KeyData::from_ffi(1));
        let sets = vec![
            ReactionSetRef {
                context: ctx,
                id: "DefaultSet".into(),
                name: "Default Set".into(),
            },
            ReactionSetRef {
                context: ctx,
                id: "Set-1".into(),
                name: "Set 1".into(),
            },
        ];
        let target = BindingTarget::reaction_set(&sets, &sets[1]);
        assert_eq!(target, BindingTarget::new(Some(1), "Set-1"));
    }
}
