//! Shared plumbing for the demo binaries.

use clap::ValueEnum;
use nalgebra::{Unit, Vector3};
use tracing_subscriber::EnvFilter;

use strider_core::traits::RayProbe;
use strider_core::types::RayHit;
use strider_test_utils::{FlatGround, SlopedGround, TerraceGround};

/// Install a compact `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Ground shapes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TerrainKind {
    Flat,
    Slope,
    Terrace,
}

/// Analytic ground for a demo run.
#[derive(Debug, Clone, Copy)]
pub enum Terrain {
    Flat(FlatGround),
    Slope(SlopedGround),
    Terrace(TerraceGround),
}

impl Terrain {
    /// Build the ground; `incline` is the slope gradient or the terrace rise.
    #[must_use]
    pub fn new(kind: TerrainKind, incline: f32) -> Self {
        match kind {
            TerrainKind::Flat => Self::Flat(FlatGround::new(0.0)),
            TerrainKind::Slope => Self::Slope(SlopedGround::new(incline)),
            TerrainKind::Terrace => Self::Terrace(TerraceGround {
                edge: 3.0,
                low: 0.0,
                high: incline,
            }),
        }
    }
}

impl RayProbe for Terrain {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        match self {
            Self::Flat(ground) => ground.cast(origin, direction, max_distance),
            Self::Slope(ground) => ground.cast(origin, direction, max_distance),
            Self::Terrace(ground) => ground.cast(origin, direction, max_distance),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Flat(ground) => ground.name(),
            Self::Slope(ground) => ground.name(),
            Self::Terrace(ground) => ground.name(),
        }
    }
}
