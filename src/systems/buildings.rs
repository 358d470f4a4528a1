use anyhow::Result;
use tracing::info;

use crate::{
    building::ProductionItem,
    engine::{System, SystemContext},
    event::EventKind,
    rng::SystemRng,
    technology,
    world::World,
};

/// Advances production queues and delivers whatever finishes.
pub struct BuildingSystem;

impl BuildingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuildingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BuildingSystem {
    fn name(&self) -> &str {
        "buildings"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.building_ids() {
            let Some(building) = world.building_mut(id) else {
                continue;
            };
            let cell = building.cell;
            let Some(item) = building.advance_production(ctx.dt_ms) else {
                continue;
            };
            match item {
                ProductionItem::Unit(kind) => {
                    let at = world.spawn_point(cell);
                    let unit = world.spawn_unit(kind, at);
                    info!(tick = ctx.tick, building = id.raw(), unit = unit.raw(), kind = kind.as_str(), "unit trained");
                    world.emit(EventKind::UnitCreated {
                        unit,
                        kind,
                        x: at.x,
                        y: at.y,
                    });
                }
                ProductionItem::Research(tech) => {
                    technology::complete_research(world, &tech);
                }
            }
        }
        Ok(())
    }
}
