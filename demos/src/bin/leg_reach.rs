//! Single-leg IK sweep.
//!
//! Solves one three-bone chain toward a sweep of targets in front of the hip
//! (or random ones) and reports how close the ankle lands, where the reach
//! clamp engaged and which solves fell back on degenerate geometry.

use std::process::ExitCode;

use clap::Parser;
use nalgebra::{Isometry3, Vector3};
use rand::Rng;
use tracing::{debug, error};

use strider_core::config::IkConfig;
use strider_core::error::StriderError;
use strider_demos::init_tracing;
use strider_ik::{AnalyticSolver, BoneChain};
use strider_test_utils::seeded_rng;

/// Sweep an analytic three-bone leg over a set of targets.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Upper leg, lower leg and foot lengths.
    #[arg(long, num_args = 3, default_values_t = [0.35, 0.45, 0.1])]
    lengths: Vec<f32>,

    /// Number of targets.
    #[arg(short = 'n', long, default_value_t = 24)]
    samples: u32,

    /// Sweep radius around the hip, as a fraction of the total leg length.
    #[arg(long, default_value_t = 0.8)]
    radius: f32,

    /// Draw random targets from this seed instead of a sweep.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Leave the foot bone unaligned.
    #[arg(long)]
    no_align: bool,
}

struct Sample {
    target: Vector3<f32>,
    error: f32,
    bend_deg: Option<f32>,
    clamped: bool,
    skipped_bend: bool,
}

fn targets(cli: &Cli, reach: f32) -> Vec<Vector3<f32>> {
    let radius = cli.radius * reach;
    match cli.seed {
        Some(seed) => {
            let mut rng = seeded_rng(seed);
            (0..cli.samples)
                .map(|_| {
                    let dir = Vector3::new(
                        rng.gen_range(-1.0_f32..1.0),
                        rng.gen_range(-1.0_f32..0.2),
                        rng.gen_range(-1.0_f32..1.0),
                    );
                    dir.try_normalize(1e-3).unwrap_or_else(|| -Vector3::y()) * radius
                })
                .collect()
        }
        None => (0..cli.samples)
            .map(|i| {
                // Half circle below the hip, back to front.
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / cli.samples.saturating_sub(1).max(1) as f32;
                let angle = std::f32::consts::PI * t;
                Vector3::new(0.0, -angle.sin(), -angle.cos()) * radius
            })
            .collect(),
    }
}

fn run(cli: &Cli) -> Result<(), StriderError> {
    let lengths = [cli.lengths[0], cli.lengths[1], cli.lengths[2]];
    let chain = BoneChain::from_segments(Isometry3::identity(), lengths)?;
    let solver = AnalyticSolver::new(IkConfig {
        align_end_effector: !cli.no_align,
        ..IkConfig::default()
    });
    solver.config().validate()?;

    // The law of cosines places the ankle, so the first two bones set the reach.
    let reach = lengths[0] + lengths[1];
    let pole = Vector3::new(0.0, reach, reach);

    let samples: Vec<Sample> = targets(cli, reach)
        .into_iter()
        .map(|target| {
            let mut posed = chain;
            let solution = solver.solve_in_place(&mut posed, &target, &pole);
            let ankle = posed.joint_positions()[2];
            debug!(?target, ?ankle, ?solution, "solved");
            Sample {
                target,
                error: (ankle - target).norm(),
                bend_deg: solution.bend_angle.map(f32::to_degrees),
                clamped: solution.reach_clamped,
                skipped_bend: solution.skipped_bend,
            }
        })
        .collect();

    println!("{:>24}  {:>8}  {:>8}  flags", "target", "error", "bend");
    for s in &samples {
        let bend = s.bend_deg.map_or_else(|| "-".to_owned(), |b| format!("{b:.1}"));
        let mut flags = Vec::new();
        if s.clamped {
            flags.push("clamped");
        }
        if s.skipped_bend {
            flags.push("no-bend");
        }
        println!(
            "({:>6.3}, {:>6.3}, {:>6.3})  {:>8.5}  {:>8}  {}",
            s.target.x,
            s.target.y,
            s.target.z,
            s.error,
            bend,
            flags.join(",")
        );
    }

    let reachable: Vec<&Sample> = samples.iter().filter(|s| !s.clamped && !s.skipped_bend).collect();
    let worst = reachable.iter().map(|s| s.error).fold(0.0_f32, f32::max);
    println!(
        "\n{} targets, {} reachable, worst reachable error {worst:.6} m",
        samples.len(),
        reachable.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing("warn");
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "leg_reach failed");
            ExitCode::FAILURE
        }
    }
}
