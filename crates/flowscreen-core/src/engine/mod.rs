//! # Engine Module
//!
//! The screening orchestrator: everything between a validated study description and a
//! finished result table.
//!
//! ## Overview
//!
//! A screening run expands every study into the Cartesian product of its parameter
//! axes and drives each resulting case through a fixed sequence of stages against a
//! fresh simulation context. The engine behind the context is treated as unreliable:
//! a failure inside one case is recorded on that case's row and never stops the run.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Study descriptions, their builders and validation
//! - **Case Generation** ([`generator`]) - Lazy, restartable Cartesian product of axes
//! - **Property Binding** ([`binding`]) - Ordered strategies for setting a property
//!   whose name or mechanism differs across engine versions
//! - **Case Execution** ([`executor`]) - The per-case stage machine
//! - **Case State** ([`state`]) - Stage enumeration and the per-case trace
//! - **Metrics** ([`metrics`]) - Derived result values and placeholder handling
//! - **Aggregation** ([`aggregator`]) - Row collection and tabular export
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Run-level and case-level error types
//!
//! ## Failure Model
//!
//! Only two things abort a run: an engine that cannot be acquired, and a configuration
//! that fails validation. Everything else degrades to a row with `Success = false`.

pub mod aggregator;
pub mod binding;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod metrics;
pub mod progress;
pub mod state;
