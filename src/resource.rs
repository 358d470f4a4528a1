use serde::{Deserialize, Serialize};

use crate::economy::ResourceKind;
use crate::grid::{Cell, WorldPos};

pub const DEFAULT_NODE_AMOUNT: u32 = 500;

/// Depletable store of a single resource kind. The world drops it as soon
/// as it runs dry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: ResourceKind,
    pub cell: Cell,
    pub position: WorldPos,
    amount: u32,
    max_amount: u32,
}

impl ResourceNode {
    pub fn new(kind: ResourceKind, cell: Cell, position: WorldPos, amount: u32) -> Self {
        Self {
            kind,
            cell,
            position,
            amount,
            max_amount: amount,
        }
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn max_amount(&self) -> u32 {
        self.max_amount
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Take up to `requested`, returning what was actually withdrawn.
    pub fn withdraw(&mut self, requested: u32) -> u32 {
        let taken = requested.min(self.amount);
        self.amount -= taken;
        taken
    }
}
