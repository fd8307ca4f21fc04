use crate::collision::pair_handler::{dispatch_pair_event, reborrow_parent, remove_from_pair_sets};
use crate::collision::{
    BroadPhaseOverlap, CollidablePair, CollisionRule, ContactChange, ContactInformation, ConvexManifold,
    NarrowPhaseContext, PairHandler, PairHandlerParent, PairHandlerState, PairManifold, PairSignature,
    TerrainConvexManifold,
};
use crate::constraints::{ContactManifoldConstraint, SharedContactConstraint, SolverUpdateable};
use crate::core::{CollidableHandle, CollidableStorage, CollisionEventType, NarrowPhaseConfig};
use crate::error::PhysicsError;
use crate::Result;
use log::error;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// A pair handler that owns one manifold and one contact constraint
#[derive(Debug, Default)]
pub struct ManifoldPairHandler<M: PairManifold> {
    state: PairHandlerState,
    manifold: M,
    constraint: SharedContactConstraint,
    entries: Option<(CollidableHandle, CollidableHandle)>,
    registered: bool,
    previous_contact_count: usize,
    changes: Vec<ContactChange>,
}

/// Handles a height field terrain against a convex shape
pub type TerrainConvexPairHandler = ManifoldPairHandler<TerrainConvexManifold>;

/// Handles two convex shapes
pub type ConvexPairHandler = ManifoldPairHandler<ConvexManifold>;

impl<M: PairManifold> ManifoldPairHandler<M> {
    /// Returns the manifold
    pub fn get_manifold(&self) -> &M {
        &self.manifold
    }

    /// Returns the contact constraint shared with the solver
    pub fn get_constraint(&self) -> &SharedContactConstraint {
        &self.constraint
    }

    /// Returns the entries in the order the manifold uses
    pub fn get_entries(&self) -> Option<(CollidableHandle, CollidableHandle)> {
        self.entries
    }

    /// Whether the constraint has been handed to the solver or a parent
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    fn bound_entries(&self) -> Result<(CollidableHandle, CollidableHandle)> {
        self.entries.ok_or(PhysicsError::HandlerNotBound)
    }

    /// Feeds the recorded manifold changes into the constraint, events and parent
    fn apply_changes(&mut self, ctx: &mut NarrowPhaseContext<'_>, mut parent: Option<&mut dyn PairHandlerParent>) -> Result<()> {
        let (a, b) = self.bound_entries()?;
        let mut changes = std::mem::take(&mut self.changes);

        for change in changes.drain(..) {
            match change {
                ContactChange::Added(contact) => {
                    self.constraint.lock().add_contact(contact);
                    if !self.state.suppress_events {
                        dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::ContactCreated, Some(&contact));
                    }
                    if let Some(parent) = reborrow_parent(&mut parent) {
                        parent.on_contact_added(ctx, &contact);
                    }
                }
                ContactChange::Removed(contact) => {
                    self.constraint.lock().remove_contact(&contact.id);
                    if !self.state.suppress_events {
                        dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::ContactRemoved, Some(&contact));
                    }
                    if let Some(parent) = reborrow_parent(&mut parent) {
                        parent.on_contact_removed(ctx, &contact);
                    }
                }
            }
        }

        self.changes = changes;
        Ok(())
    }

    fn register(&mut self, ctx: &mut NarrowPhaseContext<'_>, parent: Option<&mut dyn PairHandlerParent>) {
        let updateable = SolverUpdateable::Contact(self.constraint.clone());
        match parent {
            Some(parent) => parent.add_solver_updateable(ctx, updateable),
            None => ctx.solver_queue.enqueue_add(updateable),
        }
        self.registered = true;
    }

    fn unregister(&mut self, ctx: &mut NarrowPhaseContext<'_>, parent: Option<&mut dyn PairHandlerParent>) {
        let updateable = SolverUpdateable::Contact(self.constraint.clone());
        match parent {
            Some(parent) => parent.remove_solver_updateable(ctx, &updateable),
            None => ctx.solver_queue.enqueue_remove(updateable),
        }
        self.registered = false;
    }
}

impl<M: PairManifold> PairHandler for ManifoldPairHandler<M> {
    fn state(&self) -> &PairHandlerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PairHandlerState {
        &mut self.state
    }

    fn signature(&self) -> PairSignature {
        M::signature()
    }

    fn initialize(&mut self, ctx: &mut NarrowPhaseContext<'_>, a: CollidableHandle, b: CollidableHandle) -> Result<()> {
        if self.state.bound {
            return Err(PhysicsError::HandlerAlreadyBound);
        }

        let (entry_a, entry_b) = match M::order_entries(ctx.collidables, a, b) {
            Ok(entries) => entries,
            Err(error) => {
                error!("Cannot bind pair handler to {:?} and {:?}: {}", a, b, error);
                return Err(error);
            }
        };

        // The solver may still hold the previous constraint
        if Arc::strong_count(&self.constraint) > 1 {
            self.constraint = Arc::new(Mutex::new(ContactManifoldConstraint::new()));
        }

        let pair = CollidablePair::new(entry_a, entry_b);
        self.constraint.lock().initialize(pair);
        self.manifold.initialize(entry_a, entry_b);
        self.entries = Some((entry_a, entry_b));
        if self.state.overlap.is_none() {
            self.state.overlap = Some(BroadPhaseOverlap::new(a, b, CollisionRule::Normal));
        }
        self.state.bound = true;
        self.previous_contact_count = 0;

        if !self.state.suppress_events {
            dispatch_pair_event(ctx.collidables, entry_a, entry_b, CollisionEventType::PairCreated, None);
        }
        self.update_material_properties(ctx.collidables);

        Ok(())
    }

    fn update_collision(
        &mut self,
        ctx: &mut NarrowPhaseContext<'_>,
        mut parent: Option<&mut dyn PairHandlerParent>,
        dt: f32,
    ) -> Result<()> {
        let (a, b) = self.bound_entries()?;
        let suppress = self.state.suppress_events;

        if !suppress {
            dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::PairUpdated, None);
        }

        self.changes.clear();
        self.manifold.update(ctx.collidables, ctx.config, dt, &mut self.changes)?;
        self.apply_changes(ctx, reborrow_parent(&mut parent))?;
        self.constraint.lock().sync_geometry(self.manifold.get_contacts());

        let contact_count = self.manifold.get_contacts().len();
        if contact_count > 0 {
            if !suppress {
                dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::PairTouching, None);
            }
            if self.previous_contact_count == 0 {
                if !self.registered && self.state.collision_rule().allows_solver() {
                    self.register(ctx, reborrow_parent(&mut parent));
                }
                if !suppress {
                    dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::InitialCollisionDetected, None);
                }
            }
        } else if self.previous_contact_count > 0 {
            if self.registered {
                self.unregister(ctx, reborrow_parent(&mut parent));
            }
            if !suppress {
                dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::CollisionEnded, None);
            }
        }

        self.previous_contact_count = contact_count;
        Ok(())
    }

    fn update_time_of_impact(
        &mut self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        requester: CollidableHandle,
        dt: f32,
    ) -> Result<()> {
        if !self.state.bound {
            return Err(PhysicsError::HandlerNotBound);
        }
        self.state.time_of_impact = if config.use_ccd {
            self.manifold.time_of_impact(collidables, config, requester, dt)?.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Ok(())
    }

    fn clean_up(&mut self, ctx: &mut NarrowPhaseContext<'_>, mut parent: Option<&mut dyn PairHandlerParent>) -> Result<()> {
        let (a, b) = self.bound_entries()?;
        let had_contacts = self.previous_contact_count > 0 || !self.manifold.get_contacts().is_empty();
        self.previous_contact_count = 0;

        self.changes.clear();
        self.manifold.clean_up(&mut self.changes);
        self.apply_changes(ctx, reborrow_parent(&mut parent))?;

        // A removal may already be pending for a constraint the solver still holds
        let in_solver = self.constraint.lock().is_in_solver();
        match reborrow_parent(&mut parent) {
            Some(parent) => {
                if self.registered {
                    parent.remove_solver_updateable(ctx, &SolverUpdateable::Contact(self.constraint.clone()));
                }
                self.constraint.lock().clean_up_references();
            }
            None if self.registered || in_solver => {
                self.constraint.lock().orphan();
                ctx.solver_queue.enqueue_remove(SolverUpdateable::Contact(self.constraint.clone()));
            }
            None => self.constraint.lock().clean_up_references(),
        }
        self.registered = false;

        if !self.state.suppress_events {
            if had_contacts {
                dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::CollisionEnded, None);
            }
            dispatch_pair_event(ctx.collidables, a, b, CollisionEventType::PairRemoved, None);
        }
        remove_from_pair_sets(ctx.collidables, CollidablePair::new(a, b));

        self.reset();
        Ok(())
    }

    fn update_material_properties(&mut self, collidables: &CollidableStorage) {
        let Some((a, b)) = self.entries else {
            return;
        };
        if let (Ok(collidable_a), Ok(collidable_b)) = (collidables.get_collidable(a), collidables.get_collidable(b)) {
            self.constraint
                .lock()
                .update_material_properties(collidable_a.get_material(), collidable_b.get_material());
        }
    }

    fn contact_count(&self) -> usize {
        self.manifold.get_contacts().len()
    }

    fn contact_information(&self, collidables: &CollidableStorage, index: usize) -> Result<ContactInformation> {
        let contacts = self.manifold.get_contacts();
        let contact = *contacts.get(index).ok_or(PhysicsError::ContactIndexOutOfRange {
            index,
            count: contacts.len(),
        })?;
        let (a, b) = self.bound_entries()?;

        let (normal_impulse, friction_impulse) = self.constraint.lock().get_impulses(&contact.id).unwrap_or((0.0, 0.0));
        let velocity_a = collidables.get_collidable(a)?.get_velocity_at_point(contact.position);
        let velocity_b = collidables.get_collidable(b)?.get_velocity_at_point(contact.position);

        Ok(ContactInformation {
            contact,
            normal_impulse,
            friction_impulse,
            relative_velocity: velocity_b - velocity_a,
        })
    }

    fn reset(&mut self) {
        self.state.reset();
        self.entries = None;
        self.registered = false;
        self.previous_contact_count = 0;
        self.changes.clear();
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
