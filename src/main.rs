use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hamlet::{default_engine, EngineSettings, EventKind, ScenarioLoader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless hamlet simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/starter_village.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut world = scenario.build_world();
    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = default_engine(settings);

    info!(scenario = %scenario.name, ticks, "starting run");
    let mut trained = 0u32;
    let mut researched = 0u32;
    engine.run_with_hook(&mut world, ticks, |summary| {
        for event in &summary.events {
            match event.kind {
                EventKind::UnitCreated { .. } => trained += 1,
                EventKind::TechResearched { .. } => researched += 1,
                _ => {}
            }
        }
    })?;

    let stock = &world.economy.stockpile;
    println!(
        "Scenario '{}' completed for {} ticks ({} ms simulated).",
        scenario.name,
        ticks,
        world.now_ms()
    );
    println!(
        "Population {}/{}, age {}, units trained {}, techs researched {}",
        world.economy.population,
        world.economy.population_cap,
        world.tech.age.label(),
        trained,
        researched
    );
    println!(
        "Stockpile: wood {} food {} gold {} stone {}",
        stock.wood, stock.food, stock.gold, stock.stone
    );
    Ok(())
}
