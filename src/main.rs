//! MercSim - Mercenary Auto-Battle Simulation
//!
//! Without `--headless`, loads and cross-checks the data files and lists what
//! they contain.

use std::path::Path;
use std::process::ExitCode;

use mercsim::battle::config::{default_paths, load_databases};
use mercsim::cli::{parse_args, Args};
use mercsim::combat::SimulationSpeed;
use mercsim::error::ConfigError;
use mercsim::headless::{run_headless_match, HeadlessMatchConfig};

fn main() -> ExitCode {
    let args = parse_args();

    let outcome = match &args.headless {
        Some(path) => run_headless(path, &args),
        None => check_data(&args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_headless(path: &Path, args: &Args) -> Result<(), ConfigError> {
    let mut config = HeadlessMatchConfig::load_from_file(path)?;

    // Command-line flags override the file
    if let Some(units) = &args.units {
        config.units_path = units.clone();
    }
    if let Some(stages) = &args.stages {
        config.stages_path = stages.clone();
    }
    if let Some(output) = &args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    config.validate()?;

    let realtime = args.realtime.then(|| SimulationSpeed::new(args.speed));
    run_headless_match(config, realtime)?;
    Ok(())
}

fn check_data(args: &Args) -> Result<(), ConfigError> {
    let (default_units, default_stages) = default_paths();
    let units_path = args.units.clone().unwrap_or(default_units);
    let stages_path = args.stages.clone().unwrap_or(default_stages);

    let (units, stages) = load_databases(&units_path, &stages_path)?;

    println!("{} units in {}", units.len(), units_path.display());
    for id in units.ids() {
        println!("  {}", id);
    }
    println!("{} stages in {}", stages.len(), stages_path.display());
    for stage in stages.iter() {
        println!(
            "  {} - {} ({} enemies, {} gold)",
            stage.id,
            stage.name,
            stage.enemies.len(),
            stage.gold_reward
        );
    }
    println!("Run a match with: mercsim --headless demos/match_config.json");
    Ok(())
}
