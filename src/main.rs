use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use redcolony::{
    buildings::BuildingType,
    units::{UnitKind, UnitState},
    Action, Colony, Scenario, ScenarioLoader,
};

const FRAME_DT: f64 = 1.0 / 60.0;

const BUILD_ORDER: [BuildingType; 4] = [
    BuildingType::Housing,
    BuildingType::Farm,
    BuildingType::PowerGenerator,
    BuildingType::VehicleBay,
];

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless Mars colony runner")]
struct Cli {
    /// Path to the scenario YAML file (built-in defaults when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Fix the random seed for a reproducible colony
    #[arg(long)]
    seed: Option<u64>,

    /// Rounds to play (plays to the round cap when omitted)
    #[arg(long)]
    rounds: Option<u32>,

    /// Simulated 60 Hz frames between round advances
    #[arg(long, default_value_t = 600)]
    frames_per_round: u32,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Print the final colony snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default(),
    };
    if cli.seed.is_some() {
        scenario.seed = cli.seed;
    }
    scenario.validate()?;

    let level = cli.log_level.clone().unwrap_or_else(|| scenario.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut colony = scenario.build_colony();
    let rounds = cli
        .rounds
        .unwrap_or_else(|| scenario.economy.rounds_total.saturating_sub(1));

    for _ in 0..rounds {
        autopilot(&mut colony);
        for _ in 0..cli.frames_per_round {
            colony.tick(FRAME_DT);
        }
        match colony.perform(Action::NextRound) {
            Ok(_) => {}
            Err(rejection) => {
                info!(%rejection, "stopping");
                break;
            }
        }
    }

    let economy = colony.world().economy();
    println!(
        "Scenario '{}' finished at round {}/{}: population {}, food {}, water {}, power {}, metals {}, buildings {}",
        scenario.name,
        economy.current_round,
        economy.rounds_total,
        economy.population,
        economy.food,
        economy.water,
        economy.power,
        economy.metals,
        colony.world().buildings().len()
    );
    if cli.json {
        let snapshot = colony.world().snapshot(&scenario.name);
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{json}");
    }
    Ok(())
}

/// Place the next affordable building and keep the first rover mining.
fn autopilot(colony: &mut Colony) {
    let round = colony.world().economy().current_round as usize;
    let next = BUILD_ORDER[round % BUILD_ORDER.len()];
    if colony.world().economy().can_afford(next.spec().cost_metals) {
        if let Some(site) = colony.suggest_site(next) {
            let _ = colony.place(next, site, next.spec().size);
        }
    }

    let Some((rover, position, state)) = colony
        .world()
        .units()
        .iter()
        .find(|u| u.kind == UnitKind::Rover)
        .map(|u| (u.id, u.position, u.state()))
    else {
        return;
    };
    if state != UnitState::Idle {
        return;
    }
    let _ = colony.select(rover);
    if colony.perform(Action::MineToggle).is_ok() {
        return;
    }
    let geometry = *colony.world().geometry();
    let nearest = colony
        .world()
        .deposits()
        .iter()
        .flat_map(|d| d.positions.iter().copied())
        .map(|tile| geometry.tile_center(tile))
        .min_by(|a, b| position.distance(*a).total_cmp(&position.distance(*b)));
    if let Some(target) = nearest {
        debug!(x = target.x, y = target.y, "rover heading to deposit");
        let _ = colony.command_move(rover, target);
    }
}
