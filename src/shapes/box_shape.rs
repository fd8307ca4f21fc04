use crate::shapes::ConvexShape;
use crate::math::{Vector3, Aabb};
use std::any::Any;

/// A box (cuboid) collision shape
#[derive(Debug, Clone)]
pub struct BoxShape {
    /// The half-extents of the box (half-width, half-height, half-depth)
    half_extents: Vector3,
}

impl BoxShape {
    /// Creates a new box with the given half-extents
    pub fn new(half_extents: Vector3) -> Self {
        Self {
            half_extents: half_extents.map(|e| e.max(0.0)),
        }
    }

    /// Creates a new box with the given full dimensions
    pub fn new_with_dimensions(width: f32, height: f32, depth: f32) -> Self {
        Self::new(Vector3::new(width, height, depth) * 0.5)
    }

    /// Returns the half-extents of the box
    pub fn get_half_extents(&self) -> Vector3 {
        self.half_extents
    }

    /// Returns the full dimensions of the box
    pub fn get_dimensions(&self) -> Vector3 {
        self.half_extents * 2.0
    }
}

impl ConvexShape for BoxShape {
    fn shape_type(&self) -> &'static str {
        "Box"
    }

    fn get_local_bounds(&self) -> Aabb {
        Aabb::new(-self.half_extents, self.half_extents)
    }

    fn get_support_point(&self, direction: Vector3) -> Vector3 {
        Vector3::new(
            if direction.x >= 0.0 { self.half_extents.x } else { -self.half_extents.x },
            if direction.y >= 0.0 { self.half_extents.y } else { -self.half_extents.y },
            if direction.z >= 0.0 { self.half_extents.z } else { -self.half_extents.z },
        )
    }

    fn get_minimum_radius(&self) -> f32 {
        self.half_extents.min()
    }

    fn get_maximum_radius(&self) -> f32 {
        self.half_extents.norm()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
