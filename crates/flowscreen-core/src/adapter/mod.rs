//! # Adapter Module
//!
//! The boundary between the orchestrator and a process-simulation engine.
//!
//! ## Overview
//!
//! An engine is an opaque, synchronous, possibly unreliable service. Everything the
//! orchestrator needs from it is captured by two traits:
//!
//! - [`PropertyAccess`] - reading and writing named properties and dynamic attributes on
//!   a created object. The binding resolver depends on this surface alone.
//! - [`SimulationEngine`] - context lifecycle, compounds, unit creation, topology,
//!   reactions and solving.
//!
//! Backends are acquired through an [`EngineProvider`]. Failure to acquire one is the
//! only fatal error in a screening run and always happens before the first case.
//!
//! ## Backends
//!
//! - **Reference** ([`reference`]) - an in-process engine with a deliberately simple
//!   model and optional fault injection, used for demonstration and testing.

pub mod error;
pub mod reference;

use crate::core::models::ids::{ContextId, ReactionId};
use crate::core::models::property::PropertyValue;
use crate::core::models::reaction::{ReactionDefinition, ReactionSetRef};
use crate::core::models::stream::Position;
use crate::core::models::unit::{UnitHandle, UnitKind};
use error::EngineError;

/// Named property access on an object created by the engine.
pub trait PropertyAccess {
    /// Writes `value` to the property `name`. Names the unit does not expose fail with
    /// [`EngineError::PropertyNotFound`].
    fn set_property(
        &mut self,
        unit: &UnitHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), EngineError>;

    fn get_property(&self, unit: &UnitHandle, name: &str) -> Result<PropertyValue, EngineError>;

    /// Assigns a free-form attribute, bypassing the declared property catalog.
    fn set_attribute(
        &mut self,
        unit: &UnitHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), EngineError>;
}

/// The automation surface of a simulation engine.
///
/// Every call is blocking. Implementations are not expected to be re-entrant; the
/// orchestrator never issues overlapping calls.
pub trait SimulationEngine: PropertyAccess {
    fn name(&self) -> &str;

    /// Creates a fresh, empty simulation context.
    fn create_context(&mut self) -> Result<ContextId, EngineError>;

    /// Discards a context together with every object created inside it.
    fn release_context(&mut self, ctx: ContextId) -> Result<(), EngineError>;

    /// Adds a compound. A duplicate add fails with
    /// [`EngineError::DuplicateDefinition`], which callers treat as a warning.
    fn add_compound(&mut self, ctx: ContextId, name: &str) -> Result<(), EngineError>;

    fn add_unit(
        &mut self,
        ctx: ContextId,
        kind: UnitKind,
        position: Position,
        tag: &str,
    ) -> Result<UnitHandle, EngineError>;

    /// Adds a directional edge using the first free port on each side.
    fn connect(
        &mut self,
        ctx: ContextId,
        from: &UnitHandle,
        to: &UnitHandle,
    ) -> Result<(), EngineError>;

    fn define_reaction(
        &mut self,
        ctx: ContextId,
        definition: &ReactionDefinition,
    ) -> Result<ReactionId, EngineError>;

    /// Lists the context's reaction sets in engine order.
    fn list_reaction_sets(&self, ctx: ContextId) -> Result<Vec<ReactionSetRef>, EngineError>;

    fn create_reaction_set(
        &mut self,
        ctx: ContextId,
        name: &str,
        label: &str,
    ) -> Result<ReactionSetRef, EngineError>;

    fn add_reaction_to_set(
        &mut self,
        ctx: ContextId,
        reaction: ReactionId,
        set: &ReactionSetRef,
        enabled: bool,
        order: u32,
    ) -> Result<(), EngineError>;

    /// Solves the flowsheet and returns the solver's error messages; an empty list
    /// means the solve converged.
    fn solve(&mut self, ctx: ContextId) -> Result<Vec<String>, EngineError>;
}

/// Acquires an engine instance for a screening run.
pub trait EngineProvider {
    fn backend(&self) -> &str;

    fn connect(&self) -> Result<Box<dyn SimulationEngine>, EngineError>;
}

/// Returns the provider registered under `backend`.
pub fn provider_for(backend: &str) -> Result<Box<dyn EngineProvider>, EngineError> {
    match backend {
        reference::BACKEND_NAME => Ok(Box::new(reference::ReferenceEngineProvider::default())),
        other => Err(EngineError::Unavailable {
            backend: other.to_string(),
            reason: format!(
                "no engine backend is registered under this name (available: {})",
                reference::BACKEND_NAME
            ),
        }),
    }
}
