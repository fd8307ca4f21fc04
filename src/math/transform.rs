use crate::math::{Quaternion, Vector3, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// An affine transformation in 3D space (position, rotation, and per-axis scale)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position in 3D space
    pub position: Vector3,

    /// Rotation as a unit quaternion
    pub rotation: Quaternion,

    /// Scale in each local axis, applied before rotation
    pub scale: Vector3,
}

impl Transform {
    /// Creates a new transform with the given position, rotation, and scale
    #[inline]
    pub fn new(position: Vector3, rotation: Quaternion, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Creates a new identity transform
    #[inline]
    pub fn identity() -> Self {
        Self::from_position(Vector3::zeros())
    }

    /// Creates a new transform from just a position
    #[inline]
    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            rotation: Quaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Creates a new transform from a position and rotation
    #[inline]
    pub fn from_position_rotation(position: Vector3, rotation: Quaternion) -> Self {
        Self {
            position,
            rotation,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Transforms a point by this transform
    #[inline]
    pub fn transform_point(&self, point: Vector3) -> Vector3 {
        self.rotation * point.component_mul(&self.scale) + self.position
    }

    /// Transforms a direction vector by this transform (ignoring translation)
    #[inline]
    pub fn transform_direction(&self, direction: Vector3) -> Vector3 {
        self.rotation * direction.component_mul(&self.scale)
    }

    /// Maps a world-space point back into the local space of this transform
    pub fn inverse_transform_point(&self, point: Vector3) -> Vector3 {
        let unrotated = self.rotation.inverse_transform_vector(&(point - self.position));
        unrotated.component_mul(&self.inverse_scale())
    }

    /// The local +Y axis expressed in world space, including scale
    #[inline]
    pub fn up(&self) -> Vector3 {
        self.transform_direction(Vector3::y())
    }

    /// Combines this transform with another, applying this one first
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            position: other.transform_point(self.position),
            rotation: other.rotation * self.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    fn inverse_scale(&self) -> Vector3 {
        self.scale.map(|s| if s.abs() > EPSILON { 1.0 / s } else { 1.0 })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
