use std::fmt::Write as _;

use glam::Vec2;
use topdown_common::{CellCoord, Rect};

use crate::grid::UniformGrid;

/// Upper bound on the cells one entity may occupy.
pub const MAX_CELLS: usize = 6;

/// Cells gained and lost by one entity since its previous recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellDelta {
    pub to_add: Vec<CellCoord>,
    pub to_remove: Vec<CellCoord>,
}

impl CellDelta {
    /// Nothing to add or remove.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Cells that `bounds` intersects, starting from the cell under `centroid`.
///
/// Check order: centroid cell; left neighbour, else right; for that
/// horizontal neighbour its upper diagonal, else lower; then independently
/// the cell above, else below. Off-grid neighbours are skipped.
pub fn overlapping_cells(bounds: &Rect, centroid: Vec2, grid: &UniformGrid) -> Vec<CellCoord> {
    let exact = grid.cell_of(centroid);
    let hits = |c: CellCoord| grid.intersects_cell(bounds, c);

    let mut cells = Vec::with_capacity(MAX_CELLS);
    cells.push(exact);

    let left = exact.offset(-1, 0);
    let right = exact.offset(1, 0);
    let horizontal = if hits(left) {
        Some(left)
    } else if hits(right) {
        Some(right)
    } else {
        None
    };
    if let Some(h) = horizontal {
        cells.push(h);
        if hits(h.offset(0, -1)) {
            cells.push(h.offset(0, -1));
        } else if hits(h.offset(0, 1)) {
            cells.push(h.offset(0, 1));
        }
    }

    if hits(exact.offset(0, -1)) {
        cells.push(exact.offset(0, -1));
    } else if hits(exact.offset(0, 1)) {
        cells.push(exact.offset(0, 1));
    }

    cells
}

/// Canonical signature of a cell list: `"c,r "` per cell, in list order.
pub fn signature(cells: &[CellCoord]) -> String {
    let mut s = String::with_capacity(cells.len() * 8);
    for c in cells {
        // Writing to a String cannot fail.
        let _ = write!(s, "{c} ");
    }
    s
}

/// `current \ previous` to add and `previous \ current` to remove.
///
/// Both lists hold at most [`MAX_CELLS`] entries, so a linear scan is enough.
pub fn diff(current: &[CellCoord], previous: &[CellCoord]) -> CellDelta {
    CellDelta {
        to_add: current
            .iter()
            .filter(|c| !previous.contains(c))
            .copied()
            .collect(),
        to_remove: previous
            .iter()
            .filter(|c| !current.contains(c))
            .copied()
            .collect(),
    }
}

/// Per-entity record of the cells occupied now and at the previous recomputation.
#[derive(Debug, Clone, Default)]
pub struct MembershipTracker {
    current: Vec<CellCoord>,
    previous: Vec<CellCoord>,
    signature: String,
    previous_signature: String,
}

impl MembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells from the latest recomputation, centroid cell first.
    pub fn current(&self) -> &[CellCoord] {
        &self.current
    }

    /// Cells from the recomputation before the latest one.
    pub fn previous(&self) -> &[CellCoord] {
        &self.previous
    }

    /// Signature of [`MembershipTracker::current`].
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Recompute occupied cells and return what changed.
    ///
    /// When the signature matches the previous one the delta is empty and the
    /// caller can skip grid mutation entirely.
    pub fn recompute(&mut self, bounds: &Rect, centroid: Vec2, grid: &UniformGrid) -> CellDelta {
        let cells = overlapping_cells(bounds, centroid, grid);
        let sig = signature(&cells);
        self.previous = std::mem::replace(&mut self.current, cells);
        self.previous_signature = std::mem::replace(&mut self.signature, sig);

        if self.signature == self.previous_signature {
            return CellDelta::default();
        }
        diff(&self.current, &self.previous)
    }

    /// Forget all cells, returning the ones held until now.
    pub fn clear(&mut self) -> Vec<CellCoord> {
        self.previous.clear();
        self.signature.clear();
        self.previous_signature.clear();
        std::mem::take(&mut self.current)
    }
}
