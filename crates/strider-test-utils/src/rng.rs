//! Deterministic RNG utilities for reproducible tests.

use nalgebra::Vector3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Point on the `y = 0` plane between `min_radius` and `max_radius` from
/// the origin, in a random direction.
pub fn random_ground_target<R: Rng>(rng: &mut R, min_radius: f32, max_radius: f32) -> Vector3<f32> {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let radius = rng.gen_range(min_radius..=max_radius);
    Vector3::new(radius * angle.sin(), 0.0, radius * angle.cos())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
