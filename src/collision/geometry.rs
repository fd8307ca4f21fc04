use crate::math::{normalize_or, Transform, Vector3, EPSILON};
use crate::shapes::ConvexShape;

/// Contact geometry produced by a single shape-pair test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    /// World-space contact position
    pub position: Vector3,

    /// Normal pointing from the first shape toward the second
    pub normal: Vector3,

    /// Penetration depth; negative within the speculative margin
    pub depth: f32,
}

/// Returns the point of triangle `abc` closest to `p`
pub fn closest_point_on_triangle(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> Vector3 {
    let ab = b - a;
    let ac = c - a;

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Tests a convex shape against a one-sided terrain triangle
///
/// The triangle's face normal is `(C - A) x (B - A)`. The returned normal
/// points from the triangle toward the convex. Contacts separated by less than
/// `margin` are reported with a negative depth.
pub fn convex_triangle_contact(
    shape: &dyn ConvexShape,
    transform: &Transform,
    triangle: &[Vector3; 3],
    margin: f32,
) -> Option<ContactGeometry> {
    let [a, b, c] = *triangle;
    let face_normal = (c - a).cross(&(b - a));
    if face_normal.norm_squared() < EPSILON * EPSILON {
        return None;
    }
    let face_normal = face_normal.normalize();

    let center = transform.position;
    let closest = closest_point_on_triangle(center, a, b, c);
    let offset = center - closest;

    // Centres behind the face are pushed out along the face normal
    let normal = if offset.dot(&face_normal) > 0.0 {
        normalize_or(offset, face_normal)
    } else {
        face_normal
    };

    let deepest = shape.get_world_support_point(-normal, transform);
    let depth = (closest - deepest).dot(&normal);
    if depth <= -margin {
        return None;
    }

    Some(ContactGeometry {
        position: (closest + deepest) * 0.5,
        normal,
        depth,
    })
}

/// Tests two convex shapes along the line between their centres
pub fn convex_convex_contact(
    shape_a: &dyn ConvexShape,
    transform_a: &Transform,
    shape_b: &dyn ConvexShape,
    transform_b: &Transform,
    margin: f32,
) -> Option<ContactGeometry> {
    let normal = normalize_or(transform_b.position - transform_a.position, Vector3::y());

    let extreme_a = shape_a.get_world_support_point(normal, transform_a);
    let extreme_b = shape_b.get_world_support_point(-normal, transform_b);
    let depth = (extreme_a - extreme_b).dot(&normal);
    if depth <= -margin {
        return None;
    }

    Some(ContactGeometry {
        position: (extreme_a + extreme_b) * 0.5,
        normal,
        depth,
    })
}
