use crate::math::{Aabb, Transform, Vector3};
use std::any::Any;
use std::fmt::Debug;

/// Base trait for support-mapped convex collision shapes
pub trait ConvexShape: Send + Sync + Debug + 'static {
    /// Returns the type name of the shape
    fn shape_type(&self) -> &'static str;

    /// Returns the axis-aligned bounding box of the shape in local space
    fn get_local_bounds(&self) -> Aabb;

    /// Returns the axis-aligned bounding box of the shape in world space
    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        self.get_local_bounds().transformed(transform)
    }

    /// Returns the support point of the shape in the given local direction
    fn get_support_point(&self, direction: Vector3) -> Vector3;

    /// Returns the support point of the shape in the given direction in world space
    fn get_world_support_point(&self, direction: Vector3, transform: &Transform) -> Vector3 {
        // The transpose of rotation-then-scale maps the direction into local space
        let local_dir = transform
            .rotation
            .inverse_transform_vector(&direction)
            .component_mul(&transform.scale);

        transform.transform_point(self.get_support_point(local_dir))
    }

    /// Radius of the largest sphere centred on the origin that fits in the shape
    fn get_minimum_radius(&self) -> f32;

    /// Radius of the smallest sphere centred on the origin that contains the shape
    fn get_maximum_radius(&self) -> f32;

    /// Minimum radius after applying the transform's scale
    fn get_world_minimum_radius(&self, transform: &Transform) -> f32 {
        self.get_minimum_radius() * transform.scale.abs().min()
    }

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}
