//! Output module for reporting on the item store
//!
//! This module handles loading and printing store statistics for the
//! `stats` command.

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
