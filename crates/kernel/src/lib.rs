//! Simulation kernel: entities, the explicit simulation context, and the
//! per-tick move → regrid → collide pipeline.
//!
//! # Invariants
//! - Single-threaded and step-driven; a tick finishes before the next begins.
//! - Within a tick every position updates before any grid delta is applied.
//! - Processing order is entity list order.
//! - All structural changes are recorded as [`SimEvent`]s.

pub mod clock;
pub mod entity;
pub mod kind;
pub mod simulation;

pub use clock::TickClock;
pub use entity::{Entity, SpawnParams, heading_to_direction};
pub use kind::{Capabilities, EntityKind, KindRegistry};
pub use simulation::{
    SimEvent, Simulation, SimulationContext, SimulationError, TickStats, advance_tick,
    query_candidates,
};
