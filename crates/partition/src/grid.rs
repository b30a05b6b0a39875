use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use topdown_common::{CellCoord, EntityId, Rect};

use crate::membership::CellDelta;

/// Errors from constructing a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("world_size and cell_size must be positive (world_size={world_size}, cell_size={cell_size})")]
    NonPositive { world_size: i32, cell_size: i32 },
}

/// One grid cell: its fixed rectangle and the entities currently overlapping it.
#[derive(Debug, Clone)]
pub struct GridCell {
    rect: Rect,
    members: Vec<EntityId>,
}

impl GridCell {
    /// World-space rectangle covered by the cell.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Entities placed in this cell, in insertion order.
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }
}

/// Fixed-resolution square grid covering the whole world.
///
/// All `dimension * dimension` cells are allocated up front. Cell rectangles
/// never change; only membership lists do. The grid holds ids, never
/// entities, so it can be thrown away and rebuilt from entity state.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    world_size: i32,
    cell_size: i32,
    dimension: usize,
    /// Row-major: index = row * dimension + col.
    cells: Vec<GridCell>,
}

impl UniformGrid {
    /// Allocate every cell of a `world_size` square split into `cell_size` cells.
    pub fn new(world_size: i32, cell_size: i32) -> Result<Self, GridError> {
        if world_size <= 0 || cell_size <= 0 {
            return Err(GridError::NonPositive {
                world_size,
                cell_size,
            });
        }
        let dimension = (world_size as usize).div_ceil(cell_size as usize);
        let mut cells = Vec::with_capacity(dimension * dimension);
        for row in 0..dimension as i32 {
            for col in 0..dimension as i32 {
                cells.push(GridCell {
                    rect: Rect::new(col * cell_size, row * cell_size, cell_size, cell_size),
                    members: Vec::new(),
                });
            }
        }
        tracing::debug!(world_size, cell_size, dimension, "allocated uniform grid");
        Ok(Self {
            world_size,
            cell_size,
            dimension,
            cells,
        })
    }

    /// Side length of the world in world units.
    pub fn world_size(&self) -> i32 {
        self.world_size
    }

    /// Side length of one cell in world units.
    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Cells along one side.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn last_index(&self) -> i32 {
        self.dimension as i32 - 1
    }

    /// True when both indices lie in `[0, dimension)`.
    pub fn in_range(&self, coord: CellCoord) -> bool {
        (0..=self.last_index()).contains(&coord.col) && (0..=self.last_index()).contains(&coord.row)
    }

    /// Clamp a coordinate onto the grid.
    pub fn clamp(&self, coord: CellCoord) -> CellCoord {
        CellCoord::new(
            coord.col.clamp(0, self.last_index()),
            coord.row.clamp(0, self.last_index()),
        )
    }

    /// The cell containing `position`, clamped to the grid edges.
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        let cs = self.cell_size as f32;
        let col = (position.x / cs).floor() as i32;
        let row = (position.y / cs).floor() as i32;
        self.clamp(CellCoord::new(col, row))
    }

    fn index(&self, coord: CellCoord) -> usize {
        let c = self.clamp(coord);
        c.row as usize * self.dimension + c.col as usize
    }

    /// The cell at `coord`, or `None` off the grid.
    pub fn cell(&self, coord: CellCoord) -> Option<&GridCell> {
        if self.in_range(coord) {
            Some(&self.cells[self.index(coord)])
        } else {
            None
        }
    }

    /// Rectangle of the cell at `coord`, or `None` off the grid.
    pub fn cell_rect(&self, coord: CellCoord) -> Option<Rect> {
        self.cell(coord).map(GridCell::rect)
    }

    /// True when `coord` is on the grid and its rectangle intersects `bounds`.
    pub fn intersects_cell(&self, bounds: &Rect, coord: CellCoord) -> bool {
        self.cell_rect(coord).is_some_and(|r| bounds.intersects(&r))
    }

    /// Members of a cell; empty for coordinates off the grid.
    pub fn members(&self, coord: CellCoord) -> &[EntityId] {
        self.cell(coord).map(GridCell::members).unwrap_or(&[])
    }

    /// Add `id` to a cell. Returns false if it was already there.
    pub fn insert(&mut self, id: EntityId, coord: CellCoord) -> bool {
        let idx = self.index(coord);
        let members = &mut self.cells[idx].members;
        if members.contains(&id) {
            return false;
        }
        members.push(id);
        true
    }

    /// Remove `id` from a cell. Absent ids are ignored; returns whether it was present.
    pub fn remove(&mut self, id: EntityId, coord: CellCoord) -> bool {
        let idx = self.index(coord);
        let members = &mut self.cells[idx].members;
        match members.iter().position(|m| *m == id) {
            Some(pos) => {
                members.remove(pos);
                true
            }
            None => {
                tracing::trace!(%id, %coord, "remove of absent grid member ignored");
                false
            }
        }
    }

    /// Remove from every cell in `to_remove`, then insert into every cell in `to_add`.
    pub fn apply_delta(&mut self, id: EntityId, delta: &CellDelta) {
        for coord in &delta.to_remove {
            self.remove(id, *coord);
        }
        for coord in &delta.to_add {
            self.insert(id, *coord);
        }
    }

    /// Drop `id` from each of `cells`.
    pub fn remove_from(&mut self, id: EntityId, cells: &[CellCoord]) {
        for coord in cells {
            self.remove(id, *coord);
        }
    }

    /// Other members of `cells`, each listed once, in first-seen order.
    pub fn query_neighbors(&self, id: EntityId, cells: &[CellCoord]) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for coord in cells {
            for member in self.members(*coord) {
                if *member != id && seen.insert(*member) {
                    out.push(*member);
                }
            }
        }
        out
    }

    /// Empty every cell, keeping the allocation.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.members.clear();
        }
    }

    /// Rebuild all membership from scratch. Recovery only; the tick path uses deltas.
    pub fn rebuild<'a, I>(&mut self, placements: I)
    where
        I: IntoIterator<Item = (EntityId, &'a [CellCoord])>,
    {
        let _span = tracing::info_span!("grid_rebuild").entered();
        self.clear();
        for (id, cells) in placements {
            for coord in cells {
                self.insert(id, *coord);
            }
        }
    }

    /// Canonical view of non-empty cells with sorted members, for comparing grids.
    pub fn occupancy(&self) -> BTreeMap<CellCoord, Vec<EntityId>> {
        let mut out = BTreeMap::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.members.is_empty() {
                continue;
            }
            let coord = CellCoord::new(
                (i % self.dimension) as i32,
                (i / self.dimension) as i32,
            );
            let mut members = cell.members.clone();
            members.sort();
            out.insert(coord, members);
        }
        out
    }

    /// Number of non-empty cells.
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.members.is_empty()).count()
    }

    /// Total number of entity placements across all cells.
    pub fn total_placements(&self) -> usize {
        self.cells.iter().map(|c| c.members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> UniformGrid {
        UniformGrid::new(500, 50).unwrap()
    }

    #[test]
    fn dimension_is_ceiling() {
        assert_eq!(grid().dimension(), 10);
        assert_eq!(UniformGrid::new(510, 50).unwrap().dimension(), 11);
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        assert!(matches!(
            UniformGrid::new(500, 0),
            Err(GridError::NonPositive { .. })
        ));
        assert!(UniformGrid::new(-1, 50).is_err());
    }

    #[test]
    fn cell_rects_tile_the_world() {
        let g = grid();
        assert_eq!(g.cell_rect(CellCoord::new(0, 0)), Some(Rect::new(0, 0, 50, 50)));
        assert_eq!(
            g.cell_rect(CellCoord::new(3, 2)),
            Some(Rect::new(150, 100, 50, 50))
        );
        assert_eq!(g.cell_rect(CellCoord::new(10, 0)), None);
        assert_eq!(g.cell_rect(CellCoord::new(-1, 0)), None);
    }

    #[test]
    fn cell_of_clamps_to_grid() {
        let g = grid();
        assert_eq!(g.cell_of(Vec2::new(125.0, 60.0)), CellCoord::new(2, 1));
        assert_eq!(g.cell_of(Vec2::new(0.0, 0.0)), CellCoord::new(0, 0));
        assert_eq!(g.cell_of(Vec2::new(500.0, 500.0)), CellCoord::new(9, 9));
        assert_eq!(g.cell_of(Vec2::new(-20.0, 9999.0)), CellCoord::new(0, 9));
    }

    #[test]
    fn insert_is_duplicate_safe() {
        let mut g = grid();
        let c = CellCoord::new(1, 1);
        assert!(g.insert(EntityId(1), c));
        assert!(!g.insert(EntityId(1), c));
        assert_eq!(g.members(c), &[EntityId(1)]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut g = grid();
        let c = CellCoord::new(1, 1);
        assert!(!g.remove(EntityId(1), c));
        g.insert(EntityId(2), c);
        assert!(!g.remove(EntityId(1), c));
        assert_eq!(g.members(c), &[EntityId(2)]);
        assert!(g.remove(EntityId(2), c));
        assert!(g.members(c).is_empty());
    }

    #[test]
    fn out_of_range_coords_are_clamped_for_mutation() {
        let mut g = grid();
        g.insert(EntityId(1), CellCoord::new(42, -3));
        assert_eq!(g.members(CellCoord::new(9, 0)), &[EntityId(1)]);
        assert!(g.members(CellCoord::new(42, -3)).is_empty());
    }

    #[test]
    fn apply_delta_moves_membership() {
        let mut g = grid();
        let a = CellCoord::new(2, 2);
        let b = CellCoord::new(3, 2);
        g.insert(EntityId(1), a);
        g.apply_delta(
            EntityId(1),
            &CellDelta {
                to_add: vec![b],
                to_remove: vec![a],
            },
        );
        assert!(g.members(a).is_empty());
        assert_eq!(g.members(b), &[EntityId(1)]);
        assert_eq!(g.total_placements(), 1);
    }

    #[test]
    fn query_neighbors_dedups_and_excludes_self() {
        let mut g = grid();
        let a = CellCoord::new(2, 2);
        let b = CellCoord::new(3, 2);
        for id in [1, 2, 3] {
            g.insert(EntityId(id), a);
        }
        g.insert(EntityId(1), b);
        g.insert(EntityId(2), b);
        g.insert(EntityId(4), b);

        let n = g.query_neighbors(EntityId(1), &[a, b]);
        assert_eq!(n, vec![EntityId(2), EntityId(3), EntityId(4)]);
    }

    #[test]
    fn rebuild_replaces_membership() {
        let mut g = grid();
        g.insert(EntityId(9), CellCoord::new(0, 0));
        let cells_1 = [CellCoord::new(1, 1), CellCoord::new(2, 1)];
        let cells_2 = [CellCoord::new(2, 1)];
        g.rebuild([(EntityId(1), &cells_1[..]), (EntityId(2), &cells_2[..])]);

        assert!(g.members(CellCoord::new(0, 0)).is_empty());
        assert_eq!(g.occupied_cell_count(), 2);
        assert_eq!(g.total_placements(), 3);
        let occ = g.occupancy();
        assert_eq!(occ[&CellCoord::new(2, 1)], vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn occupancy_ignores_insertion_order() {
        let mut a = grid();
        let mut b = grid();
        let c = CellCoord::new(4, 4);
        a.insert(EntityId(1), c);
        a.insert(EntityId(2), c);
        b.insert(EntityId(2), c);
        b.insert(EntityId(1), c);
        assert_eq!(a.occupancy(), b.occupancy());
    }
}
