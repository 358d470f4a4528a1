//! Stockpile counters and population limits.
//!
//! Payments are all-or-nothing: `pay` checks every counter before touching
//! any of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Housing never raises the population cap beyond this.
pub const POPULATION_HARD_CAP: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Wood,
    Food,
    Gold,
    Stone,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Wood,
        ResourceKind::Food,
        ResourceKind::Gold,
        ResourceKind::Stone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Food => "food",
            ResourceKind::Gold => "gold",
            ResourceKind::Stone => "stone",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub wood: u32,
    pub food: u32,
    pub gold: u32,
    pub stone: u32,
}

impl Cost {
    pub const fn new(wood: u32, food: u32, gold: u32, stone: u32) -> Self {
        Self {
            wood,
            food,
            gold,
            stone,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Food => self.food,
            ResourceKind::Gold => self.gold,
            ResourceKind::Stone => self.stone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("not enough {kind:?}: need {needed}, have {available}")]
    Insufficient {
        kind: ResourceKind,
        needed: u32,
        available: u32,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    pub wood: u32,
    pub food: u32,
    pub gold: u32,
    pub stone: u32,
}

impl Stockpile {
    pub fn new(wood: u32, food: u32, gold: u32, stone: u32) -> Self {
        Self {
            wood,
            food,
            gold,
            stone,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Food => self.food,
            ResourceKind::Gold => self.gold,
            ResourceKind::Stone => self.stone,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Food => &mut self.food,
            ResourceKind::Gold => &mut self.gold,
            ResourceKind::Stone => &mut self.stone,
        }
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(amount);
    }

    /// First counter that cannot cover `cost`, if any.
    pub fn check(&self, cost: &Cost) -> Result<(), EconomyError> {
        for kind in ResourceKind::ALL {
            let needed = cost.get(kind);
            let available = self.get(kind);
            if available < needed {
                return Err(EconomyError::Insufficient {
                    kind,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.check(cost).is_ok()
    }

    pub fn pay(&mut self, cost: &Cost) -> Result<(), EconomyError> {
        self.check(cost)?;
        for kind in ResourceKind::ALL {
            *self.slot(kind) -= cost.get(kind);
        }
        Ok(())
    }
}

/// Global counters shared by every player-side entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Economy {
    pub stockpile: Stockpile,
    /// Units alive right now.
    pub population: u32,
    /// Housing provided by completed buildings, capped.
    pub population_cap: u32,
    /// Units sitting in production queues.
    pub queued_units: u32,
    /// Running total of everything villagers have dropped off.
    pub gathered: Stockpile,
}

impl Economy {
    pub fn new(stockpile: Stockpile) -> Self {
        Self {
            stockpile,
            ..Self::default()
        }
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.stockpile.can_afford(cost)
    }

    pub fn pay(&mut self, cost: &Cost) -> Result<(), EconomyError> {
        self.stockpile.pay(cost)
    }

    pub fn deposit(&mut self, kind: ResourceKind, amount: u32) {
        self.stockpile.add(kind, amount);
        self.gathered.add(kind, amount);
    }

    pub fn has_room_for_unit(&self) -> bool {
        self.population + self.queued_units < self.population_cap
    }

    pub fn set_housing(&mut self, housing: u32) {
        self.population_cap = housing.min(POPULATION_HARD_CAP);
    }
}
