use crate::shapes::ConvexShape;
use crate::math::{Vector3, Aabb, Transform, EPSILON};
use std::any::Any;

/// A spherical collision shape
#[derive(Debug, Clone)]
pub struct Sphere {
    /// The radius of the sphere
    radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given radius
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    /// Returns the radius of the sphere
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Sets the radius of the sphere
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }
}

impl ConvexShape for Sphere {
    fn shape_type(&self) -> &'static str {
        "Sphere"
    }

    fn get_local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zeros(), Vector3::repeat(self.radius))
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        // Rotation does not change a sphere's box
        let half_size = transform.scale.abs() * self.radius;
        Aabb::from_center_half_extents(transform.position, half_size)
    }

    fn get_support_point(&self, direction: Vector3) -> Vector3 {
        let length = direction.norm();
        if length < EPSILON {
            return Vector3::zeros();
        }

        direction * (self.radius / length)
    }

    fn get_minimum_radius(&self) -> f32 {
        self.radius
    }

    fn get_maximum_radius(&self) -> f32 {
        self.radius
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
