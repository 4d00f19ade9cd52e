use nalgebra::{Unit, Vector3};

use crate::types::RayHit;

// ---------------------------------------------------------------------------
// RayProbe
// ---------------------------------------------------------------------------

/// Ray queries against the host environment.
///
/// The locomotion core never owns a collision world; whoever embeds it
/// (a game engine, a physics backend, a test fixture) answers these queries.
pub trait RayProbe {
    /// Cast a ray and return the nearest hit within `max_distance`, if any.
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit>;

    /// Human-readable name for this probe.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<P: RayProbe + ?Sized> RayProbe for &P {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: RayProbe + ?Sized> RayProbe for Box<P> {
    fn cast(
        &self,
        origin: &Vector3<f32>,
        direction: &Unit<Vector3<f32>>,
        max_distance: f32,
    ) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
