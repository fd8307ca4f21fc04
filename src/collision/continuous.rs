use crate::math::{normalize_or, Ray, RayHit, Vector3, EPSILON};

/// Sweeps a sphere along a ray against a triangle
///
/// The sphere's centre starts at `ray.origin` and moves by `ray.direction` per
/// unit of `t`. Returns the earliest hit with `t` in `[0, max_t]`; a sphere
/// that already touches the triangle hits at `t = 0`. The hit normal points
/// from the triangle toward the sphere's centre at impact.
pub fn sphere_cast_triangle(ray: &Ray, radius: f32, triangle: &[Vector3; 3], max_t: f32) -> Option<RayHit> {
    let [a, b, c] = *triangle;

    let closest = crate::collision::geometry::closest_point_on_triangle(ray.origin, a, b, c);
    let offset = ray.origin - closest;
    if offset.norm_squared() <= radius * radius {
        let fallback = normalize_or((b - a).cross(&(c - a)), Vector3::y());
        return Some(RayHit {
            t: 0.0,
            location: closest,
            normal: normalize_or(offset, fallback),
        });
    }

    let mut best: Option<(f32, Vector3)> = None;
    let mut consider = |t: f32, location: Vector3| {
        if t >= 0.0 && t <= max_t && best.map_or(true, |(best_t, _)| t < best_t) {
            best = Some((t, location));
        }
    };

    // Face interior
    let plane_normal = (b - a).cross(&(c - a));
    if plane_normal.norm_squared() > EPSILON * EPSILON {
        let mut n = plane_normal.normalize();
        let mut distance = (ray.origin - a).dot(&n);
        if distance < 0.0 {
            n = -n;
            distance = -distance;
        }
        let approach = ray.direction.dot(&n);
        if approach < -EPSILON {
            let t = (distance - radius) / -approach;
            let location = ray.point_at(t) - n * radius;
            if point_in_triangle(location, a, b, c, &n) {
                consider(t, location);
            }
        }
    }

    // Edges, as capped infinite cylinders
    for (p0, p1) in [(a, b), (b, c), (c, a)] {
        let edge = p1 - p0;
        let edge_length_squared = edge.norm_squared();
        if edge_length_squared < EPSILON {
            continue;
        }
        let m = ray.origin - p0;
        let m_perp = m - edge * (m.dot(&edge) / edge_length_squared);
        let d_perp = ray.direction - edge * (ray.direction.dot(&edge) / edge_length_squared);
        if let Some(t) = earliest_root(d_perp.norm_squared(), 2.0 * m_perp.dot(&d_perp), m_perp.norm_squared() - radius * radius) {
            let s = (m + ray.direction * t).dot(&edge) / edge_length_squared;
            if (0.0..=1.0).contains(&s) {
                consider(t, p0 + edge * s);
            }
        }
    }

    // Vertices
    for vertex in [a, b, c] {
        let m = ray.origin - vertex;
        if let Some(t) = earliest_root(ray.direction.norm_squared(), 2.0 * m.dot(&ray.direction), m.norm_squared() - radius * radius) {
            consider(t, vertex);
        }
    }

    best.map(|(t, location)| RayHit {
        t,
        location,
        normal: normalize_or(ray.point_at(t) - location, -ray.direction),
    })
}

/// Decides whether a sweep hit should count against a one-sided terrain triangle
///
/// The face normal comes from the winding, `(C - A) x (B - A)`, and is resolved
/// against the terrain's up direction before being compared with the impact
/// normal.
pub fn triangle_faces_impact(triangle: &[Vector3; 3], terrain_up: Vector3, hit_normal: Vector3) -> bool {
    let [a, b, c] = *triangle;
    let normal = (c - a).cross(&(b - a));

    let dot = if normal.dot(&terrain_up) < 0.0 {
        normal.dot(&hit_normal)
    } else {
        -normal.dot(&hit_normal)
    };

    dot < 0.0
}

/// Returns the fraction of `displacement` at which a point starting at `offset`
/// first comes within `radius` of the origin, if it does so in `(0, 1]`
pub fn sphere_sweep_time(offset: Vector3, displacement: Vector3, radius: f32) -> Option<f32> {
    if offset.norm_squared() <= radius * radius {
        return None;
    }

    earliest_root(
        displacement.norm_squared(),
        2.0 * offset.dot(&displacement),
        offset.norm_squared() - radius * radius,
    )
    .filter(|t| *t <= 1.0)
}

fn earliest_root(a: f32, b: f32, c: f32) -> Option<f32> {
    if a < EPSILON * EPSILON {
        return None;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (t >= 0.0).then_some(t)
}

fn point_in_triangle(p: Vector3, a: Vector3, b: Vector3, c: Vector3, n: &Vector3) -> bool {
    let edge_test = |from: Vector3, to: Vector3| (to - from).cross(&(p - from)).dot(n);
    let ab = edge_test(a, b);
    let bc = edge_test(b, c);
    let ca = edge_test(c, a);
    (ab >= 0.0 && bc >= 0.0 && ca >= 0.0) || (ab <= 0.0 && bc <= 0.0 && ca <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground_triangle() -> [Vector3; 3] {
        [
            Vector3::new(-5.0, 0.0, -5.0),
            Vector3::new(5.0, 0.0, -5.0),
            Vector3::new(-5.0, 0.0, 5.0),
        ]
    }

    #[test]
    fn falling_sphere_hits_face() {
        let ray = Ray::new(Vector3::new(-2.0, 5.0, -2.0), Vector3::new(0.0, -16.0, 0.0));
        let hit = sphere_cast_triangle(&ray, 0.08, &ground_triangle(), 1.0).unwrap();
        assert_relative_eq!(hit.t, (5.0 - 0.08) / 16.0, epsilon = 1.0e-5);
        assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1.0e-5);
        assert!(triangle_faces_impact(&ground_triangle(), Vector3::y(), hit.normal));
    }

    #[test]
    fn sphere_grazing_an_edge() {
        let ray = Ray::new(Vector3::new(2.0, 0.3, -8.0), Vector3::new(0.0, 0.0, 10.0));
        let hit = sphere_cast_triangle(&ray, 0.5, &ground_triangle(), 1.0).unwrap();
        assert_relative_eq!(hit.t, 0.26, epsilon = 1.0e-4);
        assert_relative_eq!(hit.location, Vector3::new(2.0, 0.0, -5.0), epsilon = 1.0e-4);
    }

    #[test]
    fn hits_past_max_t_are_ignored() {
        let ray = Ray::new(Vector3::new(-2.0, 5.0, -2.0), Vector3::new(0.0, -1.0, 0.0));
        assert!(sphere_cast_triangle(&ray, 0.1, &ground_triangle(), 1.0).is_none());
    }

    #[test]
    fn back_face_impacts_are_rejected() {
        // Approaching from below, the impact normal points down
        let ray = Ray::new(Vector3::new(-2.0, -5.0, -2.0), Vector3::new(0.0, 16.0, 0.0));
        let hit = sphere_cast_triangle(&ray, 0.08, &ground_triangle(), 1.0).unwrap();
        assert!(!triangle_faces_impact(&ground_triangle(), Vector3::y(), hit.normal));
    }

    #[test]
    fn sweep_time_between_spheres() {
        let t = sphere_sweep_time(Vector3::new(10.0, 0.0, 0.0), Vector3::new(-20.0, 0.0, 0.0), 1.0).unwrap();
        assert_relative_eq!(t, 0.45, epsilon = 1.0e-6);
        assert!(sphere_sweep_time(Vector3::new(0.5, 0.0, 0.0), Vector3::new(-20.0, 0.0, 0.0), 1.0).is_none());
    }
}
