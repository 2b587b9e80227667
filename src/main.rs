use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use parkside::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::{EnvironmentSystem, SteeringSystem, WeatherSystem},
    web,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Park scene simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/park.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in ticks (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Serve the HTTP observer instead of running headless
    #[arg(long)]
    serve: bool,

    /// Observer bind host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Observer bind port
    #[arg(long, default_value_t = 7878)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli.snapshot_interval.unwrap_or(scenario.snapshot.interval);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from(scenario.snapshot.output_dir.clone()));

    if cli.serve {
        let config = web::ObserverConfig {
            scenario,
            ticks,
            snapshot_interval,
            snapshot_dir,
            host: cli.host,
            port: cli.port,
        };
        return tokio::runtime::Runtime::new()?.block_on(web::run(config));
    }

    let mut world = scenario.build_world();
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings)
        .with_system(EnvironmentSystem::new(scenario.day_night.clone()))
        .with_system(SteeringSystem::new(scenario.steering.clone()))
        .with_system(WeatherSystem::new(scenario.lightning.clone()))
        .build();

    engine.run(&mut world, ticks)?;
    println!(
        "Scenario '{}' completed for {} ticks. Walkers on the loop: {}",
        scenario.name,
        ticks,
        world.agents().len()
    );
    Ok(())
}
