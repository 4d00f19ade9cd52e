//! Headless pursuit run.
//!
//! Builds a quadruped on the chosen terrain, walks it toward a target and
//! prints per-leg step counts and run statistics.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nalgebra::Vector3;
use tracing::{error, info};

use strider_core::config::LocomotionConfig;
use strider_core::error::StriderError;
use strider_core::traits::RayProbe;
use strider_core::types::LegId;
use strider_demos::{Terrain, TerrainKind, init_tracing};
use strider_sim::{HeadlessRunner, RigBuilder};
use strider_test_utils::{random_ground_target, seeded_rng};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Walk a procedural quadruped toward a target and print statistics.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Locomotion config (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(short = 'n', long, default_value_t = 1200)]
    ticks: u64,

    /// Tick length in seconds; overrides `tick.dt` from the config.
    #[arg(long)]
    dt: Option<f32>,

    /// Target X coordinate.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    target_x: f32,

    /// Target Z coordinate.
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    target_z: f32,

    /// Pick a random target 4-10 m away instead.
    #[arg(long)]
    random_target: bool,

    /// Random seed for `--random-target`.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Ground shape.
    #[arg(long, value_enum, default_value_t = TerrainKind::Flat)]
    terrain: TerrainKind,

    /// Slope gradient or terrace height.
    #[arg(long, default_value_t = 0.2)]
    incline: f32,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn run(cli: &Cli) -> Result<(), StriderError> {
    let mut config = match &cli.config {
        Some(path) => LocomotionConfig::from_file(path)?,
        None => LocomotionConfig::default(),
    };
    if let Some(dt) = cli.dt {
        config.tick.dt = dt;
    }
    config.validate()?;

    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let target = if cli.random_target {
        random_ground_target(&mut seeded_rng(cli.seed), 4.0, 10.0)
    } else {
        Vector3::new(cli.target_x, 0.0, cli.target_z)
    };
    let terrain = Terrain::new(cli.terrain, cli.incline);
    let dt = config.tick.dt;

    let rig = RigBuilder::from_config(config).with_target(target).build(&terrain)?;
    info!(terrain = terrain.name(), ?target, "starting run");

    let mut runner = HeadlessRunner::new(rig, terrain, dt);
    let stats = runner.run(cli.ticks).clone();
    let rig = runner.rig();

    println!("simulated {} ({} ticks of {dt} s)", runner.time(), stats.ticks);
    println!("target:            ({:.2}, {:.2}, {:.2})", target.x, target.y, target.z);
    println!(
        "final body:        ({:.2}, {:.2}, {:.2})",
        rig.body().position.x,
        rig.body().position.y,
        rig.body().position.z
    );
    println!("distance walked:   {:.2} m", stats.distance_travelled);
    if let Some(remaining) = stats.final_distance_to_target {
        println!("distance to target {remaining:.2} m");
    }
    if let Some(speed) = stats.mean_speed(dt) {
        println!("mean speed:        {speed:.2} m/s");
    }
    println!("pair switches:     {}", stats.pair_switches);
    println!("max pairs moving:  {}", stats.max_stepping_pairs);
    println!("degenerate IK:     {} ticks", stats.degenerate_ik_ticks);
    println!("probe misses:      {}", stats.placement_misses);
    println!("steps:");
    for leg in LegId::ALL {
        println!("  {:<12} {}", leg.to_string(), stats.steps(leg));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    init_tracing("info");
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "spider_walk failed");
            ExitCode::FAILURE
        }
    }
}
