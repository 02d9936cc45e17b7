//! # FlowScreen Core Library
//!
//! A screening orchestrator for parametric process-simulation studies. It drives a
//! simulation engine through a stateful automation surface, sweeps reactor and
//! distillation parameter grids case by case, survives per-case failures, and collects
//! the outcome into a stable tabular report.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict layering so that the unreliable part (the engine) is
//! isolated behind a narrow contract:
//!
//! - **[`core`]: The Foundation.** Plain data models (`ParameterSet`, `StreamSpec`,
//!   `ReactionDefinition`, `UnitHandle`, `ResultRow`) and the tabular report writer.
//!
//! - **[`adapter`]: The Engine Boundary.** The `SimulationEngine` contract every backend
//!   implements, the engine error taxonomy, and the bundled in-process reference engine.
//!
//! - **[`engine`]: The Orchestrator.** Case generation, the property binding resolver,
//!   the per-case state machine, and the result aggregator.
//!
//! - **[`workflows`]: The Public API.** Entry points that tie a configured engine and a
//!   screening configuration together into a complete sweep.

pub mod adapter;
pub mod core;
pub mod engine;
pub mod workflows;
