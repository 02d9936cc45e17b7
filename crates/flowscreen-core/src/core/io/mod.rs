//! Provides output functionality for screening results.
//!
//! This module turns collected result rows into a rectangular comma-separated table.
//! The table layout (which columns, in which order) is decided by the caller; the
//! writer only guarantees that every record has exactly one cell per column.

pub mod report;
