mod transform;
mod aabb;
mod ray;

pub use transform::Transform;
pub use aabb::Aabb;
pub use ray::{Ray, RayHit};

/// A 3D vector for physics calculations
pub type Vector3 = nalgebra::Vector3<f32>;

/// A unit quaternion representing an orientation
pub type Quaternion = nalgebra::UnitQuaternion<f32>;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// A larger epsilon used to reject sweep hits that begin in contact
pub const BIG_EPSILON: f32 = 1.0e-5;

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Normalizes a vector, falling back to the given direction when it is degenerate
#[inline]
pub fn normalize_or(v: Vector3, fallback: Vector3) -> Vector3 {
    let length_squared = v.norm_squared();
    if length_squared > EPSILON * EPSILON {
        v / length_squared.sqrt()
    } else {
        fallback
    }
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
