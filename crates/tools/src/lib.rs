//! Developer tooling: simulation inspector, grid audit, tick profiling.
//!
//! # Invariants
//! - Tools only read simulation state; they never mutate it.

mod inspector;
mod profile;

pub use inspector::{EntityInfo, GridAudit, SimulationInspector, SimulationSummary};
pub use profile::{ProfileReport, TickProfile, TickSample};

pub fn crate_info() -> &'static str {
    "topdown-tools v0.1.0"
}
