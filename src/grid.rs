//! Tile grid and the isometric projection.
//!
//! Cells are cartesian tile indices; world positions are the diamond
//! projection of those cells. Every query is total: anything outside the
//! map reads as water that can never be walked.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Cartesian tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the number of 8-directional steps between cells.
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn offset(self, dx: i32, dy: i32) -> Cell {
        Cell::new(self.x + dx, self.y + dy)
    }
}

/// Isometric world-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Grass,
    Sand,
    Shore,
    Water,
}

impl Terrain {
    pub fn is_passable(self) -> bool {
        !matches!(self, Terrain::Water)
    }
}

/// Up, down, left, right, then the four diagonals.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tile_width: f32,
    tile_height: f32,
    terrain: Vec<Terrain>,
    blocked: HashSet<Cell>,
}

impl Grid {
    pub fn new(width: u32, height: u32, tile_width: f32, tile_height: f32) -> Self {
        let width = width.min(i32::MAX as u32) as i32;
        let height = height.min(i32::MAX as u32) as i32;
        Self {
            width,
            height,
            tile_width,
            tile_height,
            terrain: vec![Terrain::Grass; (width as usize) * (height as usize)],
            blocked: HashSet::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Row-major index of an in-bounds cell.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    pub fn cell_count(&self) -> usize {
        self.terrain.len()
    }

    pub fn to_iso(&self, cell: Cell) -> WorldPos {
        let half_w = self.tile_width / 2.0;
        let half_h = self.tile_height / 2.0;
        WorldPos::new(
            (cell.x - cell.y) as f32 * half_w,
            (cell.x + cell.y) as f32 * half_h,
        )
    }

    /// Inverse projection, rounded to the nearest cell.
    pub fn to_cartesian(&self, pos: WorldPos) -> Cell {
        let half_w = self.tile_width / 2.0;
        let half_h = self.tile_height / 2.0;
        let x = (pos.y / half_h + pos.x / half_w) / 2.0;
        let y = (pos.y / half_h - pos.x / half_w) / 2.0;
        Cell::new(x.round() as i32, y.round() as i32)
    }

    /// Out-of-bounds cells read as water.
    pub fn terrain(&self, cell: Cell) -> Terrain {
        self.index(cell)
            .map(|i| self.terrain[i])
            .unwrap_or(Terrain::Water)
    }

    pub fn set_terrain(&mut self, cell: Cell, terrain: Terrain) {
        if let Some(i) = self.index(cell) {
            self.terrain[i] = terrain;
        }
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.terrain(cell).is_passable() && !self.blocked.contains(&cell)
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.blocked.contains(&cell)
    }

    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) {
        if !self.in_bounds(cell) {
            return;
        }
        if blocked {
            self.blocked.insert(cell);
        } else {
            self.blocked.remove(&cell);
        }
    }

    /// In-bounds 8-neighbours of `cell`, in `NEIGHBOR_OFFSETS` order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| cell.offset(dx, dy))
            .filter(move |c| self.in_bounds(*c))
    }

    /// Reach towards a building: within `range` world units of `to`, or on a
    /// tile touching `to`'s tile. Units never stand on a blocked tile, so the
    /// far diagonal neighbour has to count too. Everything else uses plain
    /// distance.
    pub fn within_reach(&self, from: WorldPos, to: WorldPos, range: f32) -> bool {
        from.distance(to) <= range || self.to_cartesian(from).chebyshev(self.to_cartesian(to)) <= 1
    }

    /// Paint a lake: water inside `radius`, then shore and sand rings.
    pub fn paint_lake(&mut self, center: Cell, radius: f32) {
        for y in 0..self.height {
            for x in 0..self.width {
                let d = ((x - center.x) as f32).hypot((y - center.y) as f32);
                let terrain = if d < radius {
                    Terrain::Water
                } else if d < radius + 2.0 {
                    Terrain::Shore
                } else if d < radius + 5.0 {
                    Terrain::Sand
                } else {
                    continue;
                };
                self.set_terrain(Cell::new(x, y), terrain);
            }
        }
    }
}
