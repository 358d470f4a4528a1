use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    soldier, villager,
    world::World,
};

/// Villagers first, then soldiers, each in ascending id order. A unit is
/// lifted out of its table while it updates so it can act on the rest of
/// the world.
pub struct UnitSystem;

impl UnitSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for UnitSystem {
    fn name(&self) -> &str {
        "units"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.villager_ids() {
            let Some(mut unit) = world.villagers.remove(&id) else {
                continue;
            };
            villager::update(world, id, &mut unit, ctx.dt_ms);
            world.villagers.insert(id, unit);
        }
        for id in world.soldier_ids() {
            let Some(mut unit) = world.soldiers.remove(&id) else {
                continue;
            };
            soldier::update(world, id, &mut unit, ctx.dt_ms);
            world.soldiers.insert(id, unit);
        }
        Ok(())
    }
}
