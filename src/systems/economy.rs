use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Recounts population, queued units and housing after the units and
/// buildings have moved on.
pub struct EconomySystem {
    capped: bool,
}

impl EconomySystem {
    pub fn new() -> Self {
        Self { capped: false }
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.refresh_population();
        let capped = !world.economy.has_room_for_unit();
        if capped && !self.capped {
            debug!(
                tick = ctx.tick,
                population = world.economy.population,
                cap = world.economy.population_cap,
                "population capped"
            );
        }
        self.capped = capped;
        Ok(())
    }
}
