//! Grid-based spatial indices: player-AOI, NPC-AOI, and tile occupancy.
//!
//! All three share one cell-math scheme: tiles are bucketed into
//! `CELL_SIZE`-wide square cells, floor-divided toward negative infinity so
//! negative coordinates bucket correctly. A move is always vacate-then-
//! occupy against the destination cell, never a blind insert, so a moving
//! entity can never appear in two cells at once.

use core::constants::CELL_SIZE;
use std::collections::{HashMap, HashSet};

pub type CellCoord = (i32, i32);

pub fn cell_of(x: i32, y: i32) -> CellCoord {
    (x.div_euclid(CELL_SIZE), y.div_euclid(CELL_SIZE))
}

/// The 3x3 neighborhood of cells around `center`, covering any point within
/// Chebyshev distance `CELL_SIZE` of a point inside the center cell.
pub fn neighborhood(center: CellCoord) -> [CellCoord; 9] {
    let (cx, cy) = center;
    [
        (cx - 1, cy - 1),
        (cx, cy - 1),
        (cx + 1, cy - 1),
        (cx - 1, cy),
        (cx, cy),
        (cx + 1, cy),
        (cx - 1, cy + 1),
        (cx, cy + 1),
        (cx + 1, cy + 1),
    ]
}

/// A grid index mapping cells to the entity ids occupying them, keyed per
/// map. Used identically for player-AOI and NPC-AOI; only which store feeds
/// it differs.
#[derive(Default)]
pub struct AoiGrid {
    cells: HashMap<(u16, CellCoord), HashSet<u64>>,
    occupant_cell: HashMap<u64, (u16, CellCoord)>,
}

impl AoiGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: u64, map: u16, x: i32, y: i32) {
        let cell = cell_of(x, y);
        self.cells.entry((map, cell)).or_default().insert(entity_id);
        self.occupant_cell.insert(entity_id, (map, cell));
    }

    pub fn remove(&mut self, entity_id: u64) {
        if let Some((map, cell)) = self.occupant_cell.remove(&entity_id) {
            if let Some(set) = self.cells.get_mut(&(map, cell)) {
                set.remove(&entity_id);
                if set.is_empty() {
                    self.cells.remove(&(map, cell));
                }
            }
        }
    }

    /// Vacates the entity's current cell (if any) and occupies the
    /// destination cell. A no-op move (same cell) still succeeds cheaply.
    pub fn relocate(&mut self, entity_id: u64, map: u16, x: i32, y: i32) {
        self.remove(entity_id);
        self.insert(entity_id, map, x, y);
    }

    /// All entities within the 3x3 cell neighborhood of `(x, y)` on `map`,
    /// i.e. the set a visibility diff should compare a watcher against.
    pub fn nearby(&self, map: u16, x: i32, y: i32) -> HashSet<u64> {
        let mut result = HashSet::new();
        for cell in neighborhood(cell_of(x, y)) {
            if let Some(set) = self.cells.get(&(map, cell)) {
                result.extend(set.iter().copied());
            }
        }
        result
    }
}

/// Tile-occupancy set: tracks which single tiles are blocked by a
/// collidable entity (players, NPCs, doors), independent of the AOI grids.
#[derive(Default)]
pub struct OccupancyGrid {
    occupied: HashMap<(u16, i32, i32), u64>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, map: u16, x: i32, y: i32) -> bool {
        self.occupied.contains_key(&(map, x, y))
    }

    pub fn occupant_at(&self, map: u16, x: i32, y: i32) -> Option<u64> {
        self.occupied.get(&(map, x, y)).copied()
    }

    /// Attempts to occupy `(map, x, y)` for `entity_id`. Fails (returns
    /// false) if another entity already occupies that tile.
    pub fn try_occupy(&mut self, entity_id: u64, map: u16, x: i32, y: i32) -> bool {
        match self.occupied.get(&(map, x, y)) {
            Some(&other) if other != entity_id => false,
            _ => {
                self.occupied.insert((map, x, y), entity_id);
                true
            }
        }
    }

    pub fn vacate(&mut self, map: u16, x: i32, y: i32) {
        self.occupied.remove(&(map, x, y));
    }
}
