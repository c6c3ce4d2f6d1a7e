//! NetWatch: a three-tier distributed network-health monitor.
//!
//! Library crate so the rack/DC aggregator binaries and the benchmarks can
//! share the same implementation.

pub mod config;
pub mod dc;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod rack;
pub mod spectral;
pub mod stats;
pub mod telemetry;
