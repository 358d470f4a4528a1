use serde::{Deserialize, Serialize};

use crate::grid::{Grid, WorldPos};
use crate::pathfinding;

/// Within this many world units a waypoint counts as reached.
pub const ARRIVAL_THRESHOLD: f32 = 4.0;

/// Position plus at most one active path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mover {
    pub position: WorldPos,
    /// World units per second.
    pub speed: f32,
    path: Vec<WorldPos>,
    waypoint: usize,
}

impl Mover {
    pub fn new(position: WorldPos, speed: f32) -> Self {
        Self {
            position,
            speed,
            path: Vec::new(),
            waypoint: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.waypoint < self.path.len()
    }

    /// Final waypoint of the active path.
    pub fn destination(&self) -> Option<WorldPos> {
        if self.is_moving() {
            self.path.last().copied()
        } else {
            None
        }
    }

    pub fn remaining_waypoints(&self) -> &[WorldPos] {
        self.path.get(self.waypoint..).unwrap_or(&[])
    }

    pub fn stop(&mut self) {
        self.path.clear();
        self.waypoint = 0;
    }

    /// Replace the current path with one towards `dest`.
    ///
    /// Returns false when no path exists; the current path is then kept
    /// untouched. A destination on the mover's own tile is walked to
    /// directly.
    pub fn move_to(&mut self, grid: &Grid, dest: WorldPos) -> bool {
        let start = grid.to_cartesian(self.position);
        let goal = grid.to_cartesian(dest);
        if start == goal {
            self.move_direct(dest);
            return true;
        }
        let path = pathfinding::find_path(grid, start, goal);
        if path.is_empty() {
            return false;
        }
        self.path = path;
        self.waypoint = 0;
        true
    }

    /// Single straight-line leg, no pathing.
    pub fn move_direct(&mut self, dest: WorldPos) {
        self.stop();
        self.path.push(dest);
    }

    /// Walk `speed * dt` towards the current waypoint, snapping onto it once
    /// inside the arrival threshold. Returns true when the path finished
    /// during this call.
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        let Some(&target) = self.path.get(self.waypoint) else {
            return false;
        };
        let step = self.speed * dt_ms as f32 / 1000.0;
        let distance = self.position.distance(target);
        if distance <= ARRIVAL_THRESHOLD || distance <= step {
            self.position = target;
            self.waypoint += 1;
            if self.waypoint >= self.path.len() {
                self.stop();
                return true;
            }
            return false;
        }
        let scale = step / distance;
        self.position.x += (target.x - self.position.x) * scale;
        self.position.y += (target.y - self.position.y) * scale;
        false
    }
}
