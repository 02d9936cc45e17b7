//! # Core Module
//!
//! Stateless building blocks shared by every other layer of FlowScreen.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Parameters, streams, reactions, unit handles and
//!   result rows
//! - **Report I/O** ([`io`]) - Rectangular tabular export of collected results
//!
//! Nothing in this module talks to a simulation engine; the types here are the
//! vocabulary the adapter and orchestrator layers exchange.

pub mod io;
pub mod models;
