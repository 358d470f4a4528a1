//! Grid A* with 8-directional moves.
//!
//! Every step costs 1 regardless of direction and the heuristic is the
//! straight-line distance to the goal. The open set is a `BinaryHeap` with
//! reversed ordering; ties on `f` fall back to insertion order so the
//! search is a pure function of the grid and the endpoints. Scores and
//! parent links live in `Vec`s indexed by cell.
//!
//! An unwalkable goal is replaced by its walkable 8-neighbour closest to
//! the start; if there is none the search is skipped. Returned paths
//! exclude the start cell, so their length is the number of steps taken.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::grid::{Cell, Grid, WorldPos};

struct OpenEntry {
    f_score: f64,
    sequence: u64,
    cell: Cell,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: lowest f, then earliest insertion.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

fn heuristic(a: Cell, b: Cell) -> f64 {
    f64::from(a.x - b.x).hypot(f64::from(a.y - b.y))
}

/// The walkable 8-neighbour of `goal` nearest to `start`, if any.
pub fn substitute_goal(grid: &Grid, start: Cell, goal: Cell) -> Option<Cell> {
    let mut best: Option<(f64, Cell)> = None;
    for neighbor in grid.neighbors(goal) {
        if !grid.is_walkable(neighbor) {
            continue;
        }
        let d = heuristic(start, neighbor);
        if best.map_or(true, |(best_d, _)| d < best_d) {
            best = Some((d, neighbor));
        }
    }
    best.map(|(_, cell)| cell)
}

/// Cells to step through from `start` to `goal`, start excluded.
///
/// Empty when the goal (or its substitute) is the start, when no substitute
/// exists, or when the goal is unreachable.
pub fn find_cell_path(grid: &Grid, start: Cell, goal: Cell) -> Vec<Cell> {
    let goal = if grid.is_walkable(goal) {
        goal
    } else {
        match substitute_goal(grid, start, goal) {
            Some(cell) => cell,
            None => return Vec::new(),
        }
    };
    if start == goal {
        return Vec::new();
    }
    let Some(start_index) = grid.index(start) else {
        return Vec::new();
    };

    let n = grid.cell_count();
    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from: Vec<Option<Cell>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut sequence = 0_u64;

    g_score[start_index] = 0.0;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        f_score: heuristic(start, goal),
        sequence,
        cell: start,
    });

    while let Some(current) = open.pop() {
        let Some(ci) = grid.index(current.cell) else {
            continue;
        };
        if closed[ci] {
            continue;
        }
        if current.cell == goal {
            return reconstruct(grid, &came_from, start, goal);
        }
        closed[ci] = true;

        let tentative = g_score[ci] + 1.0;
        for neighbor in grid.neighbors(current.cell) {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let Some(ni) = grid.index(neighbor) else {
                continue;
            };
            if closed[ni] || tentative >= g_score[ni] {
                continue;
            }
            g_score[ni] = tentative;
            came_from[ni] = Some(current.cell);
            sequence += 1;
            open.push(OpenEntry {
                f_score: tentative + heuristic(neighbor, goal),
                sequence,
                cell: neighbor,
            });
        }
    }

    Vec::new()
}

fn reconstruct(grid: &Grid, came_from: &[Option<Cell>], start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = grid.index(current).and_then(|i| came_from[i]) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// `find_cell_path` projected into world-space waypoints.
pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Vec<WorldPos> {
    find_cell_path(grid, start, goal)
        .into_iter()
        .map(|cell| grid.to_iso(cell))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Terrain;

    fn open_grid(size: u32) -> Grid {
        Grid::new(size, size, 64.0, 32.0)
    }

    fn wall_around(grid: &mut Grid, center: Cell) {
        for (dx, dy) in crate::grid::NEIGHBOR_OFFSETS {
            grid.set_blocked(center.offset(dx, dy), true);
        }
    }

    #[test]
    fn open_grid_paths_are_chebyshev_length() {
        let grid = open_grid(9);
        for sy in 0..9 {
            for sx in 0..9 {
                for gy in 0..9 {
                    for gx in 0..9 {
                        let start = Cell::new(sx, sy);
                        let goal = Cell::new(gx, gy);
                        let path = find_cell_path(&grid, start, goal);
                        assert_eq!(
                            path.len() as i32,
                            start.chebyshev(goal),
                            "{start:?} -> {goal:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn path_steps_are_adjacent_and_end_at_goal() {
        let grid = open_grid(12);
        let start = Cell::new(1, 2);
        let goal = Cell::new(10, 6);
        let path = find_cell_path(&grid, start, goal);
        assert_eq!(path.last().copied(), Some(goal));
        let mut prev = start;
        for cell in &path {
            assert_eq!(prev.chebyshev(*cell), 1);
            prev = *cell;
        }
    }

    #[test]
    fn path_avoids_water_and_blocked_cells() {
        let mut grid = open_grid(10);
        for y in 0..8 {
            grid.set_terrain(Cell::new(4, y), Terrain::Water);
        }
        grid.set_blocked(Cell::new(5, 8), true);
        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(9, 0));
        assert!(!path.is_empty());
        for cell in &path {
            assert!(grid.is_walkable(*cell), "{cell:?} is not walkable");
        }
        assert!(path.contains(&Cell::new(4, 8)) || path.contains(&Cell::new(4, 9)));
    }

    #[test]
    fn walled_in_goal_has_no_path() {
        let mut grid = open_grid(12);
        wall_around(&mut grid, Cell::new(5, 5));
        assert!(find_path(&grid, Cell::new(0, 0), Cell::new(5, 5)).is_empty());

        grid.set_blocked(Cell::new(5, 5), true);
        assert!(find_path(&grid, Cell::new(0, 0), Cell::new(5, 5)).is_empty());
    }

    #[test]
    fn blocked_goal_substitutes_nearest_neighbor() {
        let mut grid = open_grid(10);
        grid.set_blocked(Cell::new(2, 0), true);
        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(2, 0));
        assert_eq!(path, vec![Cell::new(1, 0)]);

        let far = find_cell_path(&grid, Cell::new(6, 0), Cell::new(2, 0));
        assert_eq!(far.last().copied(), Some(Cell::new(3, 0)));
    }

    #[test]
    fn goal_outside_map_falls_back_to_edge() {
        let grid = open_grid(5);
        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(5, 2));
        assert_eq!(path.last().copied(), Some(Cell::new(4, 1)));
    }

    #[test]
    fn same_cell_is_empty_path() {
        let grid = open_grid(5);
        assert!(find_cell_path(&grid, Cell::new(2, 2), Cell::new(2, 2)).is_empty());
    }

    #[test]
    fn waypoints_are_iso_projected() {
        let grid = open_grid(5);
        let path = find_path(&grid, Cell::new(0, 0), Cell::new(2, 0));
        assert_eq!(
            path,
            vec![WorldPos::new(32.0, 16.0), WorldPos::new(64.0, 32.0)]
        );
    }
}
