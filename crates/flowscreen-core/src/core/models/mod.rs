//! # Core Models Module
//!
//! Data structures describing a screening study and its results.
//!
//! ## Key Components
//!
//! - [`ids`] - Opaque identifier types for contexts, units and reactions
//! - [`value`] - Scalar parameter values
//! - [`property`] - Values exchanged with the engine and well-known property names
//! - [`parameters`] - Parameter axes and the per-case parameter set
//! - [`stream`] - Stream descriptors used to seed feeds
//! - [`reaction`] - Kinetic reaction definitions and reaction-set references
//! - [`unit`] - Unit kinds, capability sets and unit handles
//! - [`row`] - The per-case result row

pub mod ids;
pub mod parameters;
pub mod property;
pub mod reaction;
pub mod row;
pub mod stream;
pub mod unit;
pub mod value;
