//! # Workflows Module
//!
//! High-level entry points that run a complete screening from a configuration.
//!
//! ## Overview
//!
//! A workflow acquires a simulation engine, walks every configured study and every case
//! within it, and hands back the collected rows ready for export. Callers observe
//! progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and never have to deal with per-case failures; those are already folded into the
//! rows.
//!
//! ## Architecture
//!
//! - **Screening Workflow** ([`screen`]) - Sequential execution of all studies against
//!   one engine, one isolated context per case.

pub mod screen;
