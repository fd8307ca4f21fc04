use crate::math::{Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-Aligned Bounding Box (AABB) for overlap queries
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector3,

    /// Maximum corner of the AABB
    pub max: Vector3,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector3, half_extents: Vector3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.expand_to_include_point(*point);
        }
        Some(bounds)
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vector3 {
        self.max - self.min
    }

    /// Checks if this AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Checks if this AABB intersects with another AABB
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Expands this AABB to include a point
    #[inline]
    pub fn expand_to_include_point(&mut self, point: Vector3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Expands this AABB by a margin in all directions
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        let margin_vec = Vector3::repeat(margin);
        Self {
            min: self.min - margin_vec,
            max: self.max + margin_vec,
        }
    }

    /// Returns the box covering this AABB swept along a displacement
    #[inline]
    pub fn swept(&self, displacement: Vector3) -> Self {
        self.union(&Self::new(self.min + displacement, self.max + displacement))
    }

    /// Returns the box bounding the eight transformed corners of this AABB
    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = self.corners().map(|corner| transform.transform_point(corner));
        let mut bounds = Self::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            bounds.expand_to_include_point(*corner);
        }
        bounds
    }

    /// Returns the eight corners of the box
    pub fn corners(&self) -> [Vector3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vector3::new(min.x, min.y, min.z),
            Vector3::new(max.x, min.y, min.z),
            Vector3::new(min.x, max.y, min.z),
            Vector3::new(max.x, max.y, min.z),
            Vector3::new(min.x, min.y, max.z),
            Vector3::new(max.x, min.y, max.z),
            Vector3::new(min.x, max.y, max.z),
            Vector3::new(max.x, max.y, max.z),
        ]
    }
}
