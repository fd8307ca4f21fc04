use crate::collidables::CollidableType;
use crate::collision::continuous::{sphere_cast_triangle, triangle_faces_impact};
use crate::collision::geometry::convex_triangle_contact;
use crate::collision::{Contact, ContactChange, ContactManifold, PairManifold, PairSignature, CollidablePair};
use crate::core::{CollidableHandle, CollidableStorage, NarrowPhaseConfig};
use crate::error::PhysicsError;
use crate::math::{Ray, Vector3};
use crate::shapes::TriangleIndex;
use crate::Result;
use log::{error, trace};

/// Contacts between a height field terrain and a convex shape
///
/// The triangles under the convex's (possibly swept) bounding box are cached
/// on every update and reused by the time-of-impact query. Contacts only come
/// from triangles under the convex's current, unswept bounds.
#[derive(Debug, Default)]
pub struct TerrainConvexManifold {
    manifold: ContactManifold,
    entries: Option<(CollidableHandle, CollidableHandle)>,
    overlapped_triangles: Vec<TriangleIndex>,
    touched_triangles: Vec<TriangleIndex>,
}

impl TerrainConvexManifold {
    /// Returns the triangles found under the convex's bounding box on the last update
    pub fn get_overlapped_triangles(&self) -> &[TriangleIndex] {
        &self.overlapped_triangles
    }

    /// Returns the triangles contacts were generated against on the last update
    pub fn get_touched_triangles(&self) -> &[TriangleIndex] {
        &self.touched_triangles
    }

    fn entries(&self) -> Result<(CollidableHandle, CollidableHandle)> {
        self.entries.ok_or(PhysicsError::HandlerNotBound)
    }
}

impl PairManifold for TerrainConvexManifold {
    fn signature() -> PairSignature {
        PairSignature::new(CollidableType::Terrain, CollidableType::Convex)
    }

    fn order_entries(
        collidables: &CollidableStorage,
        a: CollidableHandle,
        b: CollidableHandle,
    ) -> Result<(CollidableHandle, CollidableHandle)> {
        let type_a = collidables.get_collidable(a)?.collidable_type();
        let type_b = collidables.get_collidable(b)?.collidable_type();
        match (type_a, type_b) {
            (CollidableType::Terrain, CollidableType::Convex) => Ok((a, b)),
            (CollidableType::Convex, CollidableType::Terrain) => Ok((b, a)),
            _ => {
                error!("Terrain-convex manifold given {:?} and {:?}", type_a, type_b);
                Err(PhysicsError::InappropriatePairTypes(format!(
                    "expected terrain and convex, got {:?} and {:?}",
                    type_a, type_b
                )))
            }
        }
    }

    fn initialize(&mut self, terrain: CollidableHandle, convex: CollidableHandle) {
        self.entries = Some((terrain, convex));
        self.manifold.initialize(CollidablePair::new(terrain, convex));
        self.overlapped_triangles.clear();
        self.touched_triangles.clear();
    }

    fn update(
        &mut self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        _dt: f32,
        changes: &mut Vec<ContactChange>,
    ) -> Result<()> {
        let (terrain_handle, convex_handle) = self.entries()?;
        let terrain = collidables.get_collidable(terrain_handle)?;
        let convex = collidables.get_collidable(convex_handle)?;
        let (Some(field), Some(shape)) = (terrain.as_terrain(), convex.as_convex()) else {
            return Err(PhysicsError::InappropriatePairTypes(
                "terrain-convex entries changed kind".to_string(),
            ));
        };

        let swept_query = convex.get_bounding_box().expand(config.contact_margin);
        field.overlapped_triangles(&swept_query, terrain.get_transform(), &mut self.overlapped_triangles);

        // Contacts come from the unswept bounds; the swept set only feeds the sweep
        let query = shape.get_world_bounds(convex.get_transform()).expand(config.contact_margin);
        field.overlapped_triangles(&query, terrain.get_transform(), &mut self.touched_triangles);

        self.manifold.begin_update();
        for index in &self.touched_triangles {
            let triangle = field.triangle(*index, terrain.get_transform());
            if let Some(geometry) =
                convex_triangle_contact(shape.as_ref(), convex.get_transform(), &triangle, config.contact_margin)
            {
                self.manifold.add_candidate(index.feature_id(), geometry);
            }
        }
        self.manifold.finish_update(config, changes);

        Ok(())
    }

    fn get_contacts(&self) -> &[Contact] {
        self.manifold.get_contacts()
    }

    fn clean_up(&mut self, changes: &mut Vec<ContactChange>) {
        self.manifold.clean_up(changes);
        self.overlapped_triangles.clear();
        self.touched_triangles.clear();
        self.entries = None;
    }

    fn time_of_impact(
        &self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        _requester: CollidableHandle,
        dt: f32,
    ) -> Result<f32> {
        let (terrain_handle, convex_handle) = self.entries()?;
        let convex = collidables.get_collidable(convex_handle)?;
        let motion = convex.get_motion();
        if !motion.is_continuous() {
            return Ok(1.0);
        }
        let Some(shape) = convex.as_convex() else {
            return Ok(1.0);
        };

        let displacement = motion.linear_velocity * dt;
        let minimum_radius = shape.get_world_minimum_radius(convex.get_transform()) * config.core_shape_scaling;
        if minimum_radius * minimum_radius >= displacement.norm_squared() {
            return Ok(1.0);
        }

        let terrain = collidables.get_collidable(terrain_handle)?;
        let Some(field) = terrain.as_terrain() else {
            return Ok(1.0);
        };
        let terrain_up = terrain.get_transform().up();
        let ray = Ray::new(Vector3::zeros(), displacement);
        let origin = convex.get_position();

        let mut time_of_impact = 1.0;
        for index in &self.overlapped_triangles {
            let triangle = field
                .triangle(*index, terrain.get_transform())
                .map(|vertex| vertex - origin);
            let Some(hit) = sphere_cast_triangle(&ray, minimum_radius, &triangle, 1.0) else {
                continue;
            };
            if hit.t > config.toi_epsilon
                && hit.t < time_of_impact
                && triangle_faces_impact(&triangle, terrain_up, hit.normal)
            {
                trace!("Sweep of {:?} hit triangle {:?} at t = {}", convex_handle, index, hit.t);
                time_of_impact = hit.t;
            }
        }

        Ok(time_of_impact)
    }
}
