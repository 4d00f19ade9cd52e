//! Shared test fixtures and utilities for Strider crates.
//!
//! Provides mock ray probes standing in for a collision world, canned
//! anchors and configurations, and deterministic RNG setup.

pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{fast_config, level_anchors, square_anchors};
pub use mocks::{CountingProbe, FlatGround, NoGround, PlaneGround, SlopedGround, TerraceGround};
pub use rng::{random_ground_target, seeded_rng};
