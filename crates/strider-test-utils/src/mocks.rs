//! Mock ray probes for testing.
//!
//! Analytic grounds that answer [`RayProbe`] queries without a collision
//! world. Rays starting below a surface never hit it.

use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{Unit, Vector3};
use strider_core::traits::RayProbe;
use strider_core::types::RayHit;

// ---------------------------------------------------------------------------
// PlaneGround
// ---------------------------------------------------------------------------

/// An infinite plane through `point` with upward normal `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGround {
    point: Vector3<f32>,
    normal: Vector3<f32>,
}

impl PlaneGround {
    /// Plane through `point`; `normal` is normalized.
    pub fn new(point: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    pub const fn normal(&self) -> &Vector3<f32> {
        &self.normal
    }
}

impl RayProbe for PlaneGround {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        let denom = self.normal.dot(&direction.into_inner());
        if denom >= -1e-6 {
            return None;
        }
        let distance = self.normal.dot(&(self.point - origin)) / denom;
        (0.0..=max_distance).contains(&distance).then(|| RayHit {
            point: origin + direction.into_inner() * distance,
            normal: self.normal,
            distance,
        })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PlaneGround"
    }
}

// ---------------------------------------------------------------------------
// FlatGround / SlopedGround
// ---------------------------------------------------------------------------

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround(PlaneGround);

impl FlatGround {
    pub fn new(height: f32) -> Self {
        Self(PlaneGround::new(Vector3::new(0.0, height, 0.0), Vector3::y()))
    }
}

impl RayProbe for FlatGround {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        self.0.cast(origin, direction, max_distance)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FlatGround"
    }
}

/// Ground through the origin rising `slope` metres per metre along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopedGround(PlaneGround);

impl SlopedGround {
    pub fn new(slope: f32) -> Self {
        Self(PlaneGround::new(Vector3::zeros(), Vector3::new(0.0, 1.0, -slope)))
    }

    /// Ground height at `z`.
    #[must_use]
    pub fn height_at(&self, z: f32) -> f32 {
        -self.0.normal.z / self.0.normal.y * z
    }

    pub const fn normal(&self) -> &Vector3<f32> {
        self.0.normal()
    }
}

impl RayProbe for SlopedGround {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        self.0.cast(origin, direction, max_distance)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "SlopedGround"
    }
}

// ---------------------------------------------------------------------------
// TerraceGround
// ---------------------------------------------------------------------------

/// Two level terraces: `low` for `z < edge`, `high` from `edge` on.
///
/// The riser between them is not modelled; a ray lands on whichever terrace
/// lies under its hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerraceGround {
    pub edge: f32,
    pub low: f32,
    pub high: f32,
}

impl RayProbe for TerraceGround {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        let upper = FlatGround::new(self.high).cast(origin, direction, max_distance);
        if let Some(hit) = upper.filter(|hit| hit.point.z >= self.edge) {
            return Some(hit);
        }
        FlatGround::new(self.low)
            .cast(origin, direction, max_distance)
            .filter(|hit| hit.point.z < self.edge)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "TerraceGround"
    }
}

// ---------------------------------------------------------------------------
// NoGround
// ---------------------------------------------------------------------------

/// A probe that never hits anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoGround;

impl RayProbe for NoGround {
    fn cast(&self, _: &Vector3<f32>, _: &Unit<Vector3<f32>>, _: f32) -> Option<RayHit> {
        None
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NoGround"
    }
}

// ---------------------------------------------------------------------------
// CountingProbe
// ---------------------------------------------------------------------------

/// Wraps another probe and counts the casts made through it.
#[derive(Debug, Default)]
pub struct CountingProbe<P> {
    inner: P,
    casts: AtomicUsize,
}

impl<P> CountingProbe<P> {
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            casts: AtomicUsize::new(0),
        }
    }

    /// Casts made so far.
    pub fn casts(&self) -> usize {
        self.casts.load(Ordering::Relaxed)
    }
}

impl<P: RayProbe> RayProbe for CountingProbe<P> {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        self.casts.fetch_add(1, Ordering::Relaxed);
        self.inner.cast(origin, direction, max_distance)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
