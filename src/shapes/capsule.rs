use crate::shapes::ConvexShape;
use crate::math::{Vector3, Aabb, EPSILON};
use std::any::Any;

/// A capsule collision shape aligned with the local Y axis
#[derive(Debug, Clone)]
pub struct Capsule {
    /// The radius of the hemispherical caps and cylinder
    radius: f32,

    /// The length of the cylindrical part (excluding caps)
    height: f32,
}

impl Capsule {
    /// Creates a new capsule with the given radius and cylinder height
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius: radius.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Returns the radius of the capsule
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Returns the height of the cylindrical part
    pub fn get_height(&self) -> f32 {
        self.height
    }

    /// Returns the half height of the cylindrical part
    pub fn get_half_height(&self) -> f32 {
        self.height * 0.5
    }
}

impl ConvexShape for Capsule {
    fn shape_type(&self) -> &'static str {
        "Capsule"
    }

    fn get_local_bounds(&self) -> Aabb {
        let half = Vector3::new(self.radius, self.get_half_height() + self.radius, self.radius);
        Aabb::new(-half, half)
    }

    fn get_support_point(&self, direction: Vector3) -> Vector3 {
        let length = direction.norm();
        if length < EPSILON {
            return Vector3::zeros();
        }

        let dir = direction / length;
        let mut extreme_point = dir * self.radius;
        if dir.y > 0.0 {
            extreme_point.y += self.get_half_height();
        } else if dir.y < 0.0 {
            extreme_point.y -= self.get_half_height();
        }

        extreme_point
    }

    fn get_minimum_radius(&self) -> f32 {
        self.radius
    }

    fn get_maximum_radius(&self) -> f32 {
        self.get_half_height() + self.radius
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
