use std::collections::BTreeSet;

use topdown_common::{CellCoord, EntityId, Rect};
use topdown_kernel::{EntityKind, Simulation};
use topdown_partition::overlapping_cells;

/// Simulation inspector for developer tooling.
///
/// Read-only queries against the simulation for debugging and diagnostics.
pub struct SimulationInspector;

impl SimulationInspector {
    /// Produce a summary of the simulation state.
    pub fn summary(sim: &Simulation) -> SimulationSummary {
        let grid = sim.grid();
        SimulationSummary {
            tick: sim.tick(),
            seed: sim.seed(),
            entity_count: sim.entity_count(),
            live_count: sim.live_count(),
            grid_dimension: grid.dimension(),
            occupied_cells: grid.occupied_cell_count(),
            placements: grid.total_placements(),
            pending_events: sim.events().len(),
        }
    }

    pub fn inspect_entity(sim: &Simulation, id: EntityId) -> Option<EntityInfo> {
        sim.get(id).map(|e| {
            let p = e.position();
            EntityInfo {
                id,
                kind: e.kind(),
                position: [p.x, p.y],
                heading: e.heading(),
                speed: e.speed(),
                alive: e.is_alive(),
                bounds: e.bounds(),
                cells: e.cells().to_vec(),
                signature: e.membership().signature().to_string(),
            }
        })
    }

    /// Compare the incrementally maintained grid to one rebuilt from scratch.
    ///
    /// The rebuild recomputes each live entity's cells from its current
    /// bounds, so it also catches trackers that fell behind their entity.
    pub fn audit_grid(sim: &Simulation) -> GridAudit {
        let _span = tracing::debug_span!("audit_grid").entered();
        let mut fresh = sim.grid().clone();
        let mut stale_entities = Vec::new();
        let placements: Vec<(EntityId, Vec<CellCoord>)> = sim
            .entities()
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| {
                let cells = overlapping_cells(&e.bounds(), e.position(), sim.grid());
                if cells != e.cells() {
                    stale_entities.push(e.id());
                }
                (e.id(), cells)
            })
            .collect();
        fresh.rebuild(placements.iter().map(|(id, c)| (*id, c.as_slice())));

        let live = sim.grid().occupancy();
        let rebuilt = fresh.occupancy();
        let keys: BTreeSet<CellCoord> = live.keys().chain(rebuilt.keys()).copied().collect();
        let mismatched_cells: Vec<CellCoord> = keys
            .into_iter()
            .filter(|k| live.get(k) != rebuilt.get(k))
            .collect();

        if !mismatched_cells.is_empty() {
            tracing::warn!(
                mismatched = mismatched_cells.len(),
                "incremental grid diverged from rebuild"
            );
        }
        GridAudit {
            checked_entities: placements.len(),
            stale_entities,
            mismatched_cells,
        }
    }

    pub fn list_entities(sim: &Simulation) -> Vec<EntityId> {
        sim.entities().iter().map(|e| e.id()).collect()
    }
}

/// Summary of simulation state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub tick: u64,
    pub seed: u64,
    pub entity_count: usize,
    pub live_count: usize,
    pub grid_dimension: usize,
    pub occupied_cells: usize,
    pub placements: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Simulation: tick={} seed={:#x} entities={} live={} grid={}x{} occupied_cells={} placements={} pending_events={}",
            self.tick,
            self.seed,
            self.entity_count,
            self.live_count,
            self.grid_dimension,
            self.grid_dimension,
            self.occupied_cells,
            self.placements,
            self.pending_events
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: [f32; 2],
    pub heading: f32,
    pub speed: f32,
    pub alive: bool,
    pub bounds: Rect,
    pub cells: Vec<CellCoord>,
    pub signature: String,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity {} {:?} pos=({:.2}, {:.2}) heading={:.1}deg speed={:.1} alive={} cells=[{}]",
            self.id,
            self.kind,
            self.position[0],
            self.position[1],
            self.heading.to_degrees(),
            self.speed,
            self.alive,
            self.signature.trim_end(),
        )
    }
}

/// Result of [`SimulationInspector::audit_grid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridAudit {
    pub checked_entities: usize,
    /// Entities whose tracked cells differ from their current bounds.
    pub stale_entities: Vec<EntityId>,
    /// Cells whose member set differs between the live grid and the rebuild.
    pub mismatched_cells: Vec<CellCoord>,
}

impl GridAudit {
    pub fn is_consistent(&self) -> bool {
        self.stale_entities.is_empty() && self.mismatched_cells.is_empty()
    }
}

impl std::fmt::Display for GridAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Grid audit: entities={} stale={} mismatched_cells={} -> {}",
            self.checked_entities,
            self.stale_entities.len(),
            self.mismatched_cells.len(),
            if self.is_consistent() { "OK" } else { "MISMATCH" }
        )
    }
}
