use anyhow::Result;

use crate::{
    animal,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

pub struct AnimalSystem;

impl AnimalSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnimalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AnimalSystem {
    fn name(&self) -> &str {
        "animals"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.animal_ids() {
            let Some(mut beast) = world.animals.remove(&id) else {
                continue;
            };
            animal::update(world, id, &mut beast, ctx.dt_ms, rng);
            world.animals.insert(id, beast);
        }
        Ok(())
    }
}
