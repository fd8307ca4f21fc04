use crate::collidables::CollidableType;
use crate::collision::pair_handler::{dispatch_pair_event, reborrow_parent, remove_from_pair_sets};
use crate::collision::{
    BroadPhaseOverlap, CollidablePair, CollisionRule, Contact, ContactInformation, NarrowPhaseContext, PairHandler,
    PairHandlerParent, PairHandlerState, PairSignature,
};
use crate::constraints::{ConstraintGroup, SharedConstraintGroup, SolverUpdateable};
use crate::core::{CollidableHandle, CollidableStorage, CollisionEventType, NarrowPhaseConfig};
use crate::error::PhysicsError;
use crate::Result;
use log::{error, trace};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// The kind of entry a compound handler pairs its compound with
pub trait CompoundPartner: Debug + Default + Send + 'static {
    /// Kind of the non-compound entry
    fn partner_type() -> CollidableType;
}

/// Pairs compounds with height field terrain
#[derive(Debug, Default)]
pub struct TerrainPartner;

impl CompoundPartner for TerrainPartner {
    fn partner_type() -> CollidableType {
        CollidableType::Terrain
    }
}

/// Pairs compounds with standalone convex shapes
#[derive(Debug, Default)]
pub struct ConvexPartner;

impl CompoundPartner for ConvexPartner {
    fn partner_type() -> CollidableType {
        CollidableType::Convex
    }
}

/// The part of a compound handler its children talk to
#[derive(Debug, Default)]
pub struct CompoundLink {
    compound: CollidableHandle,
    other: CollidableHandle,
    group: SharedConstraintGroup,
    contact_count: usize,
    suppress_events: bool,
}

impl CompoundLink {
    /// Returns the constraint group collecting the children's constraints
    pub fn get_group(&self) -> &SharedConstraintGroup {
        &self.group
    }

    /// Returns the total number of contacts across all children
    pub fn get_contact_count(&self) -> usize {
        self.contact_count
    }
}

/// A compound's link together with the chain above it
///
/// Built on the stack for each child call, so the chain can be as deep as the
/// compound nesting.
pub struct ParentChain<'c, 'p> {
    link: &'c mut CompoundLink,
    up: Option<&'c mut (dyn PairHandlerParent + 'p)>,
}

impl<'c, 'p> ParentChain<'c, 'p> {
    pub fn new(link: &'c mut CompoundLink, up: Option<&'c mut (dyn PairHandlerParent + 'p)>) -> Self {
        Self { link, up }
    }
}

impl PairHandlerParent for ParentChain<'_, '_> {
    fn add_solver_updateable(&mut self, ctx: &mut NarrowPhaseContext<'_>, updateable: SolverUpdateable) {
        let became_active = {
            let mut group = self.link.group.lock();
            group.add(updateable) && group.len() == 1
        };
        if !became_active {
            return;
        }

        let group = SolverUpdateable::Group(self.link.group.clone());
        match self.up.as_deref_mut() {
            Some(up) => up.add_solver_updateable(ctx, group),
            None => ctx.solver_queue.enqueue_add(group),
        }
    }

    fn remove_solver_updateable(&mut self, ctx: &mut NarrowPhaseContext<'_>, updateable: &SolverUpdateable) {
        let became_inactive = {
            let mut group = self.link.group.lock();
            group.remove(updateable) && group.is_empty()
        };
        if !became_inactive {
            return;
        }

        let group = SolverUpdateable::Group(self.link.group.clone());
        match self.up.as_deref_mut() {
            Some(up) => up.remove_solver_updateable(ctx, &group),
            None => ctx.solver_queue.enqueue_remove(group),
        }
    }

    fn on_contact_added(&mut self, ctx: &mut NarrowPhaseContext<'_>, contact: &Contact) {
        self.link.contact_count += 1;
        if !self.link.suppress_events {
            dispatch_pair_event(
                ctx.collidables,
                self.link.compound,
                self.link.other,
                CollisionEventType::ContactCreated,
                Some(contact),
            );
        }
        if let Some(up) = self.up.as_deref_mut() {
            up.on_contact_added(ctx, contact);
        }
    }

    fn on_contact_removed(&mut self, ctx: &mut NarrowPhaseContext<'_>, contact: &Contact) {
        debug_assert!(self.link.contact_count > 0, "contact removed from a compound with no contacts");
        self.link.contact_count -= 1;
        if !self.link.suppress_events {
            dispatch_pair_event(
                ctx.collidables,
                self.link.compound,
                self.link.other,
                CollisionEventType::ContactRemoved,
                Some(contact),
            );
        }
        if let Some(up) = self.up.as_deref_mut() {
            up.on_contact_removed(ctx, contact);
        }
    }
}

/// Handles a compound against a terrain or a convex
///
/// Each step the compound's hierarchy is queried with the other entry's
/// bounding box and one child handler is kept per overlapping child. Children
/// that stopped overlapping are cleaned up before any child is updated.
#[derive(Debug, Default)]
pub struct CompoundPairHandler<P: CompoundPartner> {
    state: PairHandlerState,
    link: CompoundLink,
    sub_pairs: HashMap<CollidablePair, Box<dyn PairHandler>>,
    contained_pairs: HashSet<CollidablePair>,
    pairs_to_remove: Vec<CollidablePair>,
    overlapped_children: Vec<CollidableHandle>,
    previous_contact_count: usize,
    partner: PhantomData<P>,
}

/// Handles a compound against a height field terrain
pub type CompoundTerrainPairHandler = CompoundPairHandler<TerrainPartner>;

/// Handles a compound against a convex shape
pub type CompoundConvexPairHandler = CompoundPairHandler<ConvexPartner>;

impl<P: CompoundPartner> CompoundPairHandler<P> {
    /// Returns the child handlers, keyed by child pair
    pub fn child_pairs(&self) -> &HashMap<CollidablePair, Box<dyn PairHandler>> {
        &self.sub_pairs
    }

    /// Returns the link shared with the children
    pub fn get_link(&self) -> &CompoundLink {
        &self.link
    }

    /// Returns the entries as (compound, other)
    pub fn get_entries(&self) -> Option<(CollidableHandle, CollidableHandle)> {
        self.state.bound.then_some((self.link.compound, self.link.other))
    }

    fn sorted_keys(&self) -> Vec<CollidablePair> {
        let mut keys: Vec<CollidablePair> = self.sub_pairs.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Brings the child handlers in line with the children overlapping the other entry
    fn update_pairs(&mut self, ctx: &mut NarrowPhaseContext<'_>, mut parent: Option<&mut dyn PairHandlerParent>) -> Result<()> {
        let compound_handle = self.link.compound;
        let other_handle = self.link.other;
        let own_pair = CollidablePair::new(compound_handle, other_handle);

        let other = ctx.collidables.get_collidable(other_handle)?;
        let other_bounds = *other.get_bounding_box();
        let other_rules = *other.get_collision_rules();
        let compound = ctx
            .collidables
            .get_collidable(compound_handle)?
            .as_compound()
            .ok_or_else(|| PhysicsError::InappropriatePairTypes(format!("{:?} is no longer a compound", compound_handle)))?;
        compound.get_overlapped_children(&other_bounds, &mut self.overlapped_children);

        self.contained_pairs.clear();
        let overlapped_children = std::mem::take(&mut self.overlapped_children);
        for &child in &overlapped_children {
            let child_rules = *ctx.collidables.get_collidable(child)?.get_collision_rules();
            let rule = (ctx.rule_calculator)(&child_rules, &other_rules);
            if !rule.allows_pair() {
                continue;
            }

            let key = CollidablePair::new(child, other_handle);
            match self.sub_pairs.get_mut(&key) {
                Some(handler) => handler.state_mut().set_collision_rule(rule),
                None => {
                    let overlap = BroadPhaseOverlap::new(child, other_handle, rule);
                    let mut handler = ctx.factories.get_pair_handler(ctx.collidables, overlap)?;
                    handler.state_mut().parent = Some(own_pair);
                    handler.state_mut().suppress_events = self.link.suppress_events;
                    if let Err(error) = handler.initialize(ctx, child, other_handle) {
                        ctx.factories.give_back(handler)?;
                        return Err(error);
                    }
                    trace!("Compound {:?} gained child pair {:?}", compound_handle, key);
                    self.sub_pairs.insert(key, handler);
                }
            }
            self.contained_pairs.insert(key);
        }
        self.overlapped_children = overlapped_children;

        self.pairs_to_remove.clear();
        self.pairs_to_remove
            .extend(self.sub_pairs.keys().filter(|key| !self.contained_pairs.contains(*key)).copied());
        self.pairs_to_remove.sort_unstable();

        let mut pairs_to_remove = std::mem::take(&mut self.pairs_to_remove);
        for key in pairs_to_remove.drain(..) {
            let Some(mut handler) = self.sub_pairs.remove(&key) else {
                continue;
            };
            let mut chain = ParentChain::new(&mut self.link, reborrow_parent(&mut parent));
            handler.clean_up(ctx, Some(&mut chain))?;
            ctx.factories.give_back(handler)?;
            trace!("Compound {:?} dropped child pair {:?}", compound_handle, key);
        }
        self.pairs_to_remove = pairs_to_remove;

        Ok(())
    }
}

impl<P: CompoundPartner> PairHandler for CompoundPairHandler<P> {
    fn state(&self) -> &PairHandlerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PairHandlerState {
        &mut self.state
    }

    fn signature(&self) -> PairSignature {
        PairSignature::new(CollidableType::Compound, P::partner_type())
    }

    fn initialize(&mut self, ctx: &mut NarrowPhaseContext<'_>, a: CollidableHandle, b: CollidableHandle) -> Result<()> {
        if self.state.bound {
            return Err(PhysicsError::HandlerAlreadyBound);
        }

        let type_a = ctx.collidables.get_collidable(a)?.collidable_type();
        let type_b = ctx.collidables.get_collidable(b)?.collidable_type();
        let partner = P::partner_type();
        let (compound, other) = match (type_a, type_b) {
            (CollidableType::Compound, t) if t == partner => (a, b),
            (t, CollidableType::Compound) if t == partner => (b, a),
            _ => {
                error!("Compound-{:?} handler given {:?} and {:?}", partner, type_a, type_b);
                return Err(PhysicsError::InappropriatePairTypes(format!(
                    "expected compound and {:?}, got {:?} and {:?}",
                    partner, type_a, type_b
                )));
            }
        };

        // The solver may still hold the previous group
        if Arc::strong_count(&self.link.group) > 1 {
            self.link.group = Arc::new(Mutex::new(ConstraintGroup::new()));
        }
        let pair = CollidablePair::new(compound, other);
        self.link.group.lock().initialize(pair);
        self.link.compound = compound;
        self.link.other = other;
        self.link.contact_count = 0;
        self.link.suppress_events = self.state.suppress_events;

        if self.state.overlap.is_none() {
            self.state.overlap = Some(BroadPhaseOverlap::new(a, b, CollisionRule::Normal));
        }
        self.state.bound = true;
        self.previous_contact_count = 0;

        if !self.state.suppress_events {
            dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::PairCreated, None);
        }

        Ok(())
    }

    fn update_collision(
        &mut self,
        ctx: &mut NarrowPhaseContext<'_>,
        mut parent: Option<&mut dyn PairHandlerParent>,
        dt: f32,
    ) -> Result<()> {
        if !self.state.bound {
            return Err(PhysicsError::HandlerNotBound);
        }
        let (compound, other) = (self.link.compound, self.link.other);
        let suppress = self.state.suppress_events;

        if !suppress {
            dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::PairUpdated, None);
        }

        self.update_pairs(ctx, reborrow_parent(&mut parent))?;

        for key in self.sorted_keys() {
            let Some(handler) = self.sub_pairs.get_mut(&key) else {
                continue;
            };
            if !handler.state().collision_rule().allows_update() {
                continue;
            }
            let mut chain = ParentChain::new(&mut self.link, reborrow_parent(&mut parent));
            handler.update_collision(ctx, Some(&mut chain), dt)?;
        }

        let contact_count = self.link.contact_count;
        if contact_count > 0 {
            if !suppress {
                dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::PairTouching, None);
                if self.previous_contact_count == 0 {
                    dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::InitialCollisionDetected, None);
                }
            }
        } else if self.previous_contact_count > 0 && !suppress {
            dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::CollisionEnded, None);
        }

        self.previous_contact_count = contact_count;
        Ok(())
    }

    /// Takes the minimum over the children, each asked on behalf of the child
    /// entry standing in for `requester`
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
        if !config.use_ccd {
            self.state.time_of_impact = 1.0;
            return Ok(());
        }

        let other = self.link.other;
        let mut time_of_impact: f32 = 1.0;
        for handler in self.sub_pairs.values_mut() {
            let child_requester = if requester == other {
                other
            } else {
                match handler.state().pair().and_then(|pair| pair.other(other)) {
                    Some(child) => child,
                    None => continue,
                }
            };
            handler.update_time_of_impact(collidables, config, child_requester, dt)?;
            time_of_impact = time_of_impact.min(handler.time_of_impact());
        }

        self.state.time_of_impact = time_of_impact;
        Ok(())
    }

    fn clean_up(&mut self, ctx: &mut NarrowPhaseContext<'_>, mut parent: Option<&mut dyn PairHandlerParent>) -> Result<()> {
        if !self.state.bound {
            return Err(PhysicsError::HandlerNotBound);
        }
        let (compound, other) = (self.link.compound, self.link.other);
        let should_notify = self.link.contact_count > 0 && !self.link.suppress_events;

        for key in self.sorted_keys() {
            let Some(mut handler) = self.sub_pairs.remove(&key) else {
                continue;
            };
            let mut chain = ParentChain::new(&mut self.link, reborrow_parent(&mut parent));
            handler.clean_up(ctx, Some(&mut chain))?;
            ctx.factories.give_back(handler)?;
        }

        if Arc::strong_count(&self.link.group) > 1 {
            self.link.group.lock().orphan();
        } else {
            self.link.group.lock().clean_up_references();
        }

        if should_notify {
            dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::CollisionEnded, None);
        }
        if !self.state.suppress_events {
            dispatch_pair_event(ctx.collidables, compound, other, CollisionEventType::PairRemoved, None);
        }
        remove_from_pair_sets(ctx.collidables, CollidablePair::new(compound, other));

        self.reset();
        Ok(())
    }

    fn update_material_properties(&mut self, collidables: &CollidableStorage) {
        for handler in self.sub_pairs.values_mut() {
            handler.update_material_properties(collidables);
        }
    }

    fn contact_count(&self) -> usize {
        self.link.contact_count
    }

    fn contact_information(&self, collidables: &CollidableStorage, index: usize) -> Result<ContactInformation> {
        let mut remaining = index;
        for key in self.sorted_keys() {
            let Some(handler) = self.sub_pairs.get(&key) else {
                continue;
            };
            let count = handler.contact_count();
            if remaining < count {
                return handler.contact_information(collidables, remaining);
            }
            remaining -= count;
        }
        Err(PhysicsError::ContactIndexOutOfRange {
            index,
            count: index - remaining,
        })
    }

    fn reset(&mut self) {
        self.state.reset();
        self.link.compound = CollidableHandle::default();
        self.link.other = CollidableHandle::default();
        self.link.contact_count = 0;
        self.link.suppress_events = false;
        self.contained_pairs.clear();
        self.pairs_to_remove.clear();
        self.overlapped_children.clear();
        self.previous_contact_count = 0;
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
