use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Fires due callbacks and sweeps up anything left in an impossible state.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let fired = world.run_due_callbacks();
        if fired > 0 {
            debug!(tick = ctx.tick, fired, "callbacks fired");
        }

        let empty: Vec<_> = world
            .resource_ids()
            .into_iter()
            .filter(|id| world.resource(*id).is_some_and(|r| r.is_empty()))
            .collect();
        for id in empty {
            world.deplete_resource(id);
        }

        for unit in world.villagers.values_mut() {
            unit.combat.hp = unit.combat.hp.min(unit.combat.max_hp);
        }
        for unit in world.soldiers.values_mut() {
            unit.combat.hp = unit.combat.hp.min(unit.combat.max_hp);
        }
        Ok(())
    }
}
