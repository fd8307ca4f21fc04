use crate::collidables::CollidableType;
use crate::collision::continuous::sphere_sweep_time;
use crate::collision::geometry::convex_convex_contact;
use crate::collision::{CollidablePair, Contact, ContactChange, ContactManifold, PairManifold, PairSignature};
use crate::core::{CollidableHandle, CollidableStorage, NarrowPhaseConfig};
use crate::error::PhysicsError;
use crate::Result;
use log::{error, trace};

/// Contacts between two convex shapes
#[derive(Debug, Default)]
pub struct ConvexManifold {
    manifold: ContactManifold,
    entries: Option<(CollidableHandle, CollidableHandle)>,
}

impl PairManifold for ConvexManifold {
    fn signature() -> PairSignature {
        PairSignature::new(CollidableType::Convex, CollidableType::Convex)
    }

    fn order_entries(
        collidables: &CollidableStorage,
        a: CollidableHandle,
        b: CollidableHandle,
    ) -> Result<(CollidableHandle, CollidableHandle)> {
        let type_a = collidables.get_collidable(a)?.collidable_type();
        let type_b = collidables.get_collidable(b)?.collidable_type();
        if type_a != CollidableType::Convex || type_b != CollidableType::Convex {
            error!("Convex manifold given {:?} and {:?}", type_a, type_b);
            return Err(PhysicsError::InappropriatePairTypes(format!(
                "expected two convexes, got {:?} and {:?}",
                type_a, type_b
            )));
        }
        Ok((a, b))
    }

    fn initialize(&mut self, entry_a: CollidableHandle, entry_b: CollidableHandle) {
        self.entries = Some((entry_a, entry_b));
        self.manifold.initialize(CollidablePair::new(entry_a, entry_b));
    }

    fn update(
        &mut self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        _dt: f32,
        changes: &mut Vec<ContactChange>,
    ) -> Result<()> {
        let (a, b) = self.entries.ok_or(PhysicsError::HandlerNotBound)?;
        let collidable_a = collidables.get_collidable(a)?;
        let collidable_b = collidables.get_collidable(b)?;
        let (Some(shape_a), Some(shape_b)) = (collidable_a.as_convex(), collidable_b.as_convex()) else {
            return Err(PhysicsError::InappropriatePairTypes(
                "convex entries changed kind".to_string(),
            ));
        };

        self.manifold.begin_update();
        if let Some(geometry) = convex_convex_contact(
            shape_a.as_ref(),
            collidable_a.get_transform(),
            shape_b.as_ref(),
            collidable_b.get_transform(),
            config.contact_margin,
        ) {
            self.manifold.add_candidate(0, geometry);
        }
        self.manifold.finish_update(config, changes);

        Ok(())
    }

    fn get_contacts(&self) -> &[Contact] {
        self.manifold.get_contacts()
    }

    fn clean_up(&mut self, changes: &mut Vec<ContactChange>) {
        self.manifold.clean_up(changes);
        self.entries = None;
    }

    /// Sweeps a sphere of the combined minimum radii along the requester's
    /// displacement relative to the other entry
    fn time_of_impact(
        &self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        requester: CollidableHandle,
        dt: f32,
    ) -> Result<f32> {
        let (a, b) = self.entries.ok_or(PhysicsError::HandlerNotBound)?;
        let other = if requester == a {
            b
        } else if requester == b {
            a
        } else {
            return Err(PhysicsError::InvalidParameter(format!(
                "{:?} is not part of pair ({:?}, {:?})",
                requester, a, b
            )));
        };

        let mover = collidables.get_collidable(requester)?;
        if !mover.get_motion().is_continuous() {
            return Ok(1.0);
        }
        let obstacle = collidables.get_collidable(other)?;
        let (Some(mover_shape), Some(obstacle_shape)) = (mover.as_convex(), obstacle.as_convex()) else {
            return Ok(1.0);
        };

        let displacement = (mover.get_linear_velocity() - obstacle.get_linear_velocity()) * dt;
        let radius = (mover_shape.get_world_minimum_radius(mover.get_transform())
            + obstacle_shape.get_world_minimum_radius(obstacle.get_transform()))
            * config.core_shape_scaling;
        if radius * radius >= displacement.norm_squared() {
            return Ok(1.0);
        }

        let offset = mover.get_position() - obstacle.get_position();
        match sphere_sweep_time(offset, displacement, radius) {
            Some(t) if t > config.toi_epsilon => {
                trace!("Sweep of {:?} hit {:?} at t = {}", requester, other, t);
                Ok(t)
            }
            _ => Ok(1.0),
        }
    }
}
