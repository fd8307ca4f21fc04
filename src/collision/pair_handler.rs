use crate::collision::{
    BroadPhaseOverlap, CollidablePair, CollisionRule, CollisionRuleCalculator, Contact, ContactInformation,
    PairFactories, PairSignature,
};
use crate::constraints::{SolverQueue, SolverUpdateable};
use crate::core::{CollidableHandle, CollidableStorage, CollisionEventType, NarrowPhaseConfig, Storage};
use crate::error::PhysicsError;
use crate::Result;
use std::any::Any;
use std::fmt::Debug;

/// Where a pair handler stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairHandlerStatus {
    /// Sitting in a pool, or never initialized
    Unbound,

    /// Bound to two entries that are not touching
    BoundNoContact,

    /// Bound to two entries with at least one contact
    BoundInContact,
}

/// Everything a pair handler may touch while it runs
///
/// Built by the narrow phase for the duration of one operation and threaded
/// through composite handlers down to their children.
pub struct NarrowPhaseContext<'a> {
    /// The collidables of the simulation
    pub collidables: &'a mut CollidableStorage,

    /// Factories that hand out and take back pair handlers
    pub factories: &'a mut PairFactories,

    /// Solver additions and removals waiting for the next flush
    pub solver_queue: &'a mut SolverQueue,

    /// Narrow phase settings
    pub config: &'a NarrowPhaseConfig,

    /// Resolves the rule for pairs created below the top level
    pub rule_calculator: CollisionRuleCalculator,
}

/// The receiving end of a child handler's notifications
///
/// A child handler never hands its constraint to the solver directly when it
/// has a parent. Notifications travel up the chain until the root decides what
/// becomes visible to the solver.
pub trait PairHandlerParent {
    /// A child's constraint became active
    fn add_solver_updateable(&mut self, ctx: &mut NarrowPhaseContext<'_>, updateable: SolverUpdateable);

    /// A child's constraint became inactive
    fn remove_solver_updateable(&mut self, ctx: &mut NarrowPhaseContext<'_>, updateable: &SolverUpdateable);

    /// A child's manifold gained a contact
    fn on_contact_added(&mut self, ctx: &mut NarrowPhaseContext<'_>, contact: &Contact);

    /// A child's manifold lost a contact
    fn on_contact_removed(&mut self, ctx: &mut NarrowPhaseContext<'_>, contact: &Contact);
}

/// State shared by every pair handler
#[derive(Debug, Clone)]
pub struct PairHandlerState {
    /// The overlap this handler was acquired for
    pub overlap: Option<BroadPhaseOverlap>,

    /// Fraction of the last step at which the entries first touch; 1 means never
    pub time_of_impact: f32,

    /// Whether lifecycle and contact events are withheld
    pub suppress_events: bool,

    /// The composite pair this handler is a child of
    pub parent: Option<CollidablePair>,

    /// Whether the handler is between `initialize` and `clean_up`
    pub bound: bool,
}

impl Default for PairHandlerState {
    fn default() -> Self {
        Self {
            overlap: None,
            time_of_impact: 1.0,
            suppress_events: false,
            parent: None,
            bound: false,
        }
    }
}

impl PairHandlerState {
    /// The rule governing this pair
    pub fn collision_rule(&self) -> CollisionRule {
        self.overlap.map_or(CollisionRule::Normal, |overlap| overlap.collision_rule)
    }

    /// Replaces the rule governing this pair
    pub fn set_collision_rule(&mut self, rule: CollisionRule) {
        if let Some(overlap) = self.overlap.as_mut() {
            overlap.collision_rule = rule;
        }
    }

    /// The order-independent key of this pair
    pub fn pair(&self) -> Option<CollidablePair> {
        self.overlap.map(|overlap| overlap.pair())
    }

    /// Returns the state to its pooled form
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Manages the relationship between two collidables over time
///
/// Handlers are acquired from a factory, bound with `initialize`, updated once
/// per step and unbound with `clean_up` before going back to their factory.
pub trait PairHandler: Debug + Send + 'static {
    /// Returns the shared handler state
    fn state(&self) -> &PairHandlerState;

    /// Returns the shared handler state for modification
    fn state_mut(&mut self) -> &mut PairHandlerState;

    /// The kinds of collidable this handler manages
    fn signature(&self) -> PairSignature;

    /// Binds the handler to two entries, checking and ordering their kinds
    fn initialize(
        &mut self,
        ctx: &mut NarrowPhaseContext<'_>,
        a: CollidableHandle,
        b: CollidableHandle,
    ) -> Result<()>;

    /// Records the pair in both entries' pair sets
    fn on_added_to_narrow_phase(&mut self, collidables: &mut CollidableStorage) -> Result<()> {
        let pair = self.state().pair().ok_or(PhysicsError::HandlerNotBound)?;
        for handle in [pair.collidable_a, pair.collidable_b] {
            collidables.get_collidable_mut(handle)?.get_pairs_mut().insert(pair);
        }
        Ok(())
    }

    /// Runs one step of the contact state machine
    fn update_collision(
        &mut self,
        ctx: &mut NarrowPhaseContext<'_>,
        parent: Option<&mut dyn PairHandlerParent>,
        dt: f32,
    ) -> Result<()>;

    /// Recomputes `time_of_impact` for a step of length `dt` as seen by `requester`
    fn update_time_of_impact(
        &mut self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        requester: CollidableHandle,
        dt: f32,
    ) -> Result<()>;

    /// Tears down contacts, constraint and events and unbinds the handler
    fn clean_up(&mut self, ctx: &mut NarrowPhaseContext<'_>, parent: Option<&mut dyn PairHandlerParent>) -> Result<()>;

    /// Pushes the entries' current materials into the constraint
    fn update_material_properties(&mut self, collidables: &CollidableStorage);

    /// Number of contacts currently held
    fn contact_count(&self) -> usize;

    /// Returns the contact at `index` together with solver data
    fn contact_information(&self, collidables: &CollidableStorage, index: usize) -> Result<ContactInformation>;

    /// Clears everything so the handler can sit in a pool
    fn reset(&mut self);

    fn status(&self) -> PairHandlerStatus {
        if !self.state().bound {
            PairHandlerStatus::Unbound
        } else if self.contact_count() > 0 {
            PairHandlerStatus::BoundInContact
        } else {
            PairHandlerStatus::BoundNoContact
        }
    }

    /// The last computed time of impact, in `[0, 1]`
    fn time_of_impact(&self) -> f32 {
        self.state().time_of_impact
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_any(&self) -> &dyn Any;
}

/// Lends out the parent for one call
///
/// The trait object lifetime has to shrink to the reborrow, which `as_deref_mut`
/// cannot do through the `Option`.
pub(crate) fn reborrow_parent<'p>(
    parent: &'p mut Option<&mut dyn PairHandlerParent>,
) -> Option<&'p mut dyn PairHandlerParent> {
    parent.as_mut().map(|parent| &mut **parent as &mut dyn PairHandlerParent)
}

/// Raises an event on both entries of a pair, each seeing itself as the sender
pub(crate) fn dispatch_pair_event(
    collidables: &CollidableStorage,
    a: CollidableHandle,
    b: CollidableHandle,
    event_type: CollisionEventType,
    contact: Option<&Contact>,
) {
    if let Some(collidable) = collidables.get(a) {
        collidable.get_events().dispatch(a, b, event_type, contact);
    }
    if let Some(collidable) = collidables.get(b) {
        collidable.get_events().dispatch(b, a, event_type, contact);
    }
}

/// Drops a pair from both entries' pair sets
pub(crate) fn remove_from_pair_sets(collidables: &mut CollidableStorage, pair: CollidablePair) {
    for handle in [pair.collidable_a, pair.collidable_b] {
        if let Some(collidable) = collidables.get_mut(handle) {
            collidable.get_pairs_mut().remove(&pair);
        }
    }
}
