use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Ray representation for intersection and sweep tests
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Origin of the ray
    pub origin: Vector3,

    /// Direction of the ray (not normalized; its length is one unit of `t`)
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    #[inline]
    pub fn new(origin: Vector3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Returns the point at a given parameter along the ray
    #[inline]
    pub fn point_at(&self, t: f32) -> Vector3 {
        self.origin + self.direction * t
    }
}

/// The result of a ray or sweep hitting something
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RayHit {
    /// Ray parameter of the hit
    pub t: f32,

    /// Point of contact on the target surface
    pub location: Vector3,

    /// Surface normal at the hit, pointing from the target toward the caster
    pub normal: Vector3,
}
