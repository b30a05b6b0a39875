use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use topdown_collide::{CollisionMode, test_overlap};
use topdown_common::{CellCoord, ConfigError, EntityId, WorldConfig};
use topdown_partition::{CellDelta, GridError, UniformGrid};

use crate::entity::{Entity, SpawnParams};
use crate::kind::{EntityKind, KindRegistry};

/// Errors from building or feeding a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("grid error: {0}")]
    Grid(#[from] GridError),
    #[error("entity size must be positive, got {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
}

/// An event record produced by every structural change to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        position: Vec2,
    },
    Despawned {
        id: EntityId,
    },
    /// Grid membership changed for one entity.
    CellsChanged {
        id: EntityId,
        added: Vec<CellCoord>,
        removed: Vec<CellCoord>,
    },
    Stepped {
        tick: u64,
        seed: u64,
    },
}

/// World settings, the grid and the kind table, passed explicitly to
/// anything that needs them.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub config: WorldConfig,
    pub grid: UniformGrid,
    pub registry: KindRegistry,
}

impl SimulationContext {
    /// Validate `config` and allocate an empty grid for it.
    pub fn new(config: WorldConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let grid = UniformGrid::new(config.world_size, config.cell_size)?;
        Ok(Self {
            config,
            grid,
            registry: KindRegistry::default(),
        })
    }
}

/// Counters from one [`advance_tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub moved: usize,
    pub reflected: usize,
    /// Entities whose grid membership changed.
    pub regridded: usize,
    pub cells_added: usize,
    pub cells_removed: usize,
}

/// Move every live entity, then push each one's membership delta into the grid.
///
/// All positions update before any delta is applied; both passes run in slice
/// order, so the result is reproducible.
pub fn advance_tick(entities: &mut [Entity], dt: f32, ctx: &mut SimulationContext) -> TickStats {
    advance_tick_observed(entities, dt, ctx, |_, _| {})
}

fn advance_tick_observed<F>(
    entities: &mut [Entity],
    dt: f32,
    ctx: &mut SimulationContext,
    mut on_delta: F,
) -> TickStats
where
    F: FnMut(EntityId, &CellDelta),
{
    let _span = tracing::info_span!("advance_tick", entities = entities.len()).entered();
    let mut stats = TickStats::default();
    let tick_rate = ctx.config.ticks_per_second;
    let base_rate = ctx.config.base_tick_rate;

    for entity in entities.iter_mut() {
        if !entity.is_alive() || !ctx.registry.is_movable(entity.kind()) {
            continue;
        }
        if entity.reflect_at_border() {
            stats.reflected += 1;
        }
        entity.advance(dt, tick_rate, base_rate);
        stats.moved += 1;
    }

    for entity in entities.iter_mut() {
        if !entity.is_alive() {
            continue;
        }
        let delta = entity.recompute_membership(&ctx.grid);
        if delta.is_empty() {
            continue;
        }
        tracing::trace!(
            id = %entity.id(),
            added = delta.to_add.len(),
            removed = delta.to_remove.len(),
            "applying cell delta"
        );
        ctx.grid.apply_delta(entity.id(), &delta);
        stats.regridded += 1;
        stats.cells_added += delta.to_add.len();
        stats.cells_removed += delta.to_remove.len();
        on_delta(entity.id(), &delta);
    }

    tracing::trace!(
        moved = stats.moved,
        regridded = stats.regridded,
        "tick complete"
    );
    stats
}

/// Broad-phase candidates for `entity`: everyone sharing one of its cells.
pub fn query_candidates(entity: &Entity, grid: &UniformGrid) -> Vec<EntityId> {
    grid.query_neighbors(entity.id(), entity.cells())
}

/// Owns the flat entity list and the context, and records every change.
///
/// Entity ids are sequential and the seed advances with splitmix64, so the
/// same seed and sequence of operations always produce the same state.
#[derive(Debug, Clone)]
pub struct Simulation {
    ctx: SimulationContext,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    next_id: u64,
    tick: u64,
    seed: u64,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Empty simulation with seed zero.
    pub fn new(config: WorldConfig) -> Result<Self, SimulationError> {
        Self::with_seed(config, 0)
    }

    /// Empty simulation with a specific seed for deterministic replay.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Result<Self, SimulationError> {
        Ok(Self {
            ctx: SimulationContext::new(config)?,
            entities: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            tick: 0,
            seed,
            events: Vec::new(),
        })
    }

    /// Config, grid and kind table.
    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Active world settings.
    pub fn config(&self) -> &WorldConfig {
        &self.ctx.config
    }

    /// Broad-phase grid, kept in step with entity membership.
    pub fn grid(&self) -> &UniformGrid {
        &self.ctx.grid
    }

    /// Kind table, for registering custom kinds.
    pub fn registry_mut(&mut self) -> &mut KindRegistry {
        &mut self.ctx.registry
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current seed; advances on every step and every seeded spawn.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Change the running tick rate. Entity speeds stay tuned to the base rate.
    ///
    /// A rate that is not positive is rejected and the old rate kept.
    pub fn set_ticks_per_second(&mut self, ticks_per_second: f32) -> Result<(), SimulationError> {
        let config = WorldConfig {
            ticks_per_second,
            ..self.ctx.config.clone()
        };
        config.validate()?;
        tracing::debug!(ticks_per_second, "tick rate changed");
        self.ctx.config = config;
        Ok(())
    }

    /// All entities in processing order, including dead ones not yet swept.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities in the list, dead ones included.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities not yet killed.
    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_alive()).count()
    }

    /// Look up an entity, dead or alive, until it is swept.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    /// Mutable access; grid membership catches up on the next step.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index.get(&id).map(|&i| &mut self.entities[i])
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take all pending events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Place a new entity and register it in the grid.
    pub fn spawn(&mut self, params: SpawnParams) -> Result<EntityId, SimulationError> {
        if params.width <= 0 || params.height <= 0 {
            return Err(SimulationError::InvalidSize {
                width: params.width,
                height: params.height,
            });
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut entity = Entity::new(id, &params, self.ctx.config.world_size);
        let delta = entity.recompute_membership(&self.ctx.grid);
        self.ctx.grid.apply_delta(id, &delta);

        tracing::debug!(
            %id,
            kind = ?entity.kind(),
            position = ?entity.position(),
            cells = entity.cells().len(),
            "spawned entity"
        );
        self.events.push(SimEvent::Spawned {
            id,
            kind: entity.kind(),
            position: entity.position(),
        });
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        Ok(id)
    }

    /// Spawn `count` entities at seeded random positions and headings.
    ///
    /// Positions keep one sprite-width away from the world edge.
    pub fn spawn_scattered(
        &mut self,
        count: usize,
        kind: EntityKind,
        size: (i32, i32),
        speed: f32,
    ) -> Result<Vec<EntityId>, SimulationError> {
        let (w, h) = size;
        let world = self.ctx.config.world_size;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let x = self.next_in_range(w, world - w);
            let y = self.next_in_range(h, world - h);
            let degrees = self.next_in_range(0, 360);
            let params = SpawnParams::new(kind, Vec2::new(x as f32, y as f32))
                .with_size(w, h)
                .with_heading((degrees as f32).to_radians())
                .with_speed(speed);
            ids.push(self.spawn(params)?);
        }
        Ok(ids)
    }

    /// Uniform-ish integer in `[lo, hi)`; `lo` when the range is empty.
    fn next_in_range(&mut self, lo: i32, hi: i32) -> i32 {
        self.seed = splitmix64(self.seed);
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u64;
        lo + (self.seed % span) as i32
    }

    /// Mark an entity dead and take it out of the grid.
    ///
    /// It stays in the entity list, visible to [`Simulation::get`], until
    /// [`Simulation::sweep_dead`]. Returns false if it was already dead or unknown.
    pub fn kill(&mut self, id: EntityId) -> bool {
        let Some(&i) = self.index.get(&id) else {
            return false;
        };
        let entity = &mut self.entities[i];
        if !entity.is_alive() {
            return false;
        }
        entity.kill();
        let cells = entity.clear_membership();
        self.ctx.grid.remove_from(id, &cells);
        tracing::debug!(%id, cells = cells.len(), "killed entity");
        if !cells.is_empty() {
            self.events.push(SimEvent::CellsChanged {
                id,
                added: Vec::new(),
                removed: cells,
            });
        }
        true
    }

    /// Drop dead entities from the entity list.
    pub fn sweep_dead(&mut self) -> Vec<EntityId> {
        let removed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| !e.is_alive())
            .map(|e| e.id())
            .collect();
        if removed.is_empty() {
            return removed;
        }
        self.entities.retain(|e| e.is_alive());
        self.reindex();
        for id in &removed {
            tracing::debug!(%id, "swept dead entity");
            self.events.push(SimEvent::Despawned { id: *id });
        }
        removed
    }

    fn reindex(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i))
            .collect();
    }

    /// Advance one tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> TickStats {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
        let events = &mut self.events;
        let stats = advance_tick_observed(&mut self.entities, dt, &mut self.ctx, |id, delta| {
            events.push(SimEvent::CellsChanged {
                id,
                added: delta.to_add.clone(),
                removed: delta.to_remove.clone(),
            });
        });
        self.events.push(SimEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
        stats
    }

    /// Broad-phase candidates for `id`; empty if it is unknown.
    pub fn candidates(&self, id: EntityId) -> Vec<EntityId> {
        self.get(id)
            .map(|e| query_candidates(e, &self.ctx.grid))
            .unwrap_or_default()
    }

    /// Every overlapping pair of live entities, as sorted `(lower, higher)` ids.
    pub fn find_collisions(&self, mode: CollisionMode) -> Vec<(EntityId, EntityId)> {
        let _span = tracing::debug_span!("find_collisions", ?mode).entered();
        let mut pairs = Vec::new();
        for entity in self.entities.iter().filter(|e| e.is_alive()) {
            for other_id in query_candidates(entity, &self.ctx.grid) {
                if other_id <= entity.id() {
                    continue;
                }
                let Some(other) = self.get(other_id) else {
                    continue;
                };
                if other.is_alive() && test_overlap(mode, entity, other) {
                    pairs.push((entity.id(), other_id));
                }
            }
        }
        pairs.sort();
        pairs
    }

    /// Throw the grid away and rebuild it from every live entity's bounds.
    ///
    /// Each tracker is recomputed first, so entities moved outside a tick are
    /// placed where they are now.
    pub fn rebuild_grid(&mut self) {
        let _span = tracing::info_span!("rebuild_grid").entered();
        let grid = &self.ctx.grid;
        for entity in self.entities.iter_mut().filter(|e| e.is_alive()) {
            entity.recompute_membership(grid);
        }
        let entities = &self.entities;
        self.ctx.grid.rebuild(
            entities
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| (e.id(), e.cells())),
        );
    }

    /// Deterministic FNV-1a hash over tick, seed and entity state.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for e in &self.entities {
            mix(&mut h, &e.id().0.to_le_bytes());
            mix(&mut h, &e.position().x.to_le_bytes());
            mix(&mut h, &e.position().y.to_le_bytes());
            mix(&mut h, &e.heading().to_le_bytes());
            mix(&mut h, &[e.is_alive() as u8]);
            for c in e.cells() {
                mix(&mut h, &c.col.to_le_bytes());
                mix(&mut h, &c.row.to_le_bytes());
            }
        }
        h
    }
}

/// Splitmix64 step; drives the seed and seeded spawning.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
