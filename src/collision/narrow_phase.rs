use crate::collision::{
    default_collision_rule_calculator, BroadPhaseOverlap, CollidablePair, CollisionRuleCalculator,
    NarrowPhaseContext, PairFactories, PairHandler,
};
use crate::constraints::{Solver, SolverQueue};
use crate::core::{CollidableHandle, CollidableStorage, NarrowPhaseConfig};
use crate::error::PhysicsError;
use crate::Result;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Owns the top-level pair handlers and drives them each step
///
/// Overlaps reported by a broad phase come in through `add_overlap` and
/// `remove_overlap`. Solver changes produced while handlers run are queued and
/// applied to a `Solver` by `flush`.
pub struct NarrowPhase {
    pairs: HashMap<CollidablePair, Box<dyn PairHandler>>,
    factories: PairFactories,
    solver_queue: SolverQueue,
    config: NarrowPhaseConfig,
    rule_calculator: CollisionRuleCalculator,
}

impl fmt::Debug for NarrowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowPhase")
            .field("pairs", &self.pairs.len())
            .field("factories", &self.factories)
            .field("solver_queue", &self.solver_queue)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for NarrowPhase {
    fn default() -> Self {
        Self::new(NarrowPhaseConfig::default())
    }
}

impl NarrowPhase {
    /// Creates a new narrow phase with the default factories
    pub fn new(config: NarrowPhaseConfig) -> Self {
        Self::with_factories(config, PairFactories::new())
    }

    /// Creates a new narrow phase with a custom set of factories
    pub fn with_factories(config: NarrowPhaseConfig, factories: PairFactories) -> Self {
        Self {
            pairs: HashMap::new(),
            factories,
            solver_queue: SolverQueue::new(),
            config,
            rule_calculator: default_collision_rule_calculator,
        }
    }

    /// Replaces the collision rule resolver
    pub fn set_rule_calculator(&mut self, rule_calculator: CollisionRuleCalculator) {
        self.rule_calculator = rule_calculator;
    }

    /// Starts managing an overlap between two collidables
    ///
    /// Returns `false` if the pair already exists or its collision rule
    /// forbids a narrow-phase pair.
    pub fn add_overlap(&mut self, collidables: &mut CollidableStorage, a: CollidableHandle, b: CollidableHandle) -> Result<bool> {
        self.insert_overlap(collidables, a, b, false)
    }

    /// Starts managing an overlap whose handler raises no events
    ///
    /// Contacts and solver constraints are produced as usual. Child pairs of a
    /// silent compound pair are silent too.
    pub fn add_silent_overlap(
        &mut self,
        collidables: &mut CollidableStorage,
        a: CollidableHandle,
        b: CollidableHandle,
    ) -> Result<bool> {
        self.insert_overlap(collidables, a, b, true)
    }

    fn insert_overlap(
        &mut self,
        collidables: &mut CollidableStorage,
        a: CollidableHandle,
        b: CollidableHandle,
        suppress_events: bool,
    ) -> Result<bool> {
        if a == b {
            return Err(PhysicsError::InvalidParameter(format!(
                "A collidable cannot overlap itself ({:?})",
                a
            )));
        }

        let key = CollidablePair::new(a, b);
        if self.pairs.contains_key(&key) {
            return Ok(false);
        }

        let rule = (self.rule_calculator)(
            collidables.get_collidable(a)?.get_collision_rules(),
            collidables.get_collidable(b)?.get_collision_rules(),
        );
        if !rule.allows_pair() {
            return Ok(false);
        }

        let Self {
            pairs,
            factories,
            solver_queue,
            config,
            rule_calculator,
        } = self;

        let mut handler = factories.get_pair_handler(collidables, BroadPhaseOverlap::new(a, b, rule))?;
        handler.state_mut().suppress_events = suppress_events;
        let mut ctx = NarrowPhaseContext {
            collidables,
            factories,
            solver_queue,
            config,
            rule_calculator: *rule_calculator,
        };
        if let Err(error) = handler.initialize(&mut ctx, a, b) {
            ctx.factories.give_back(handler)?;
            return Err(error);
        }
        handler.on_added_to_narrow_phase(ctx.collidables)?;

        debug!("Added pair {:?} ({:?}, silent: {})", key, rule, suppress_events);
        pairs.insert(key, handler);
        Ok(true)
    }

    /// Stops managing an overlap, cleaning up its handler
    ///
    /// Returns `false` if there was no such pair.
    pub fn remove_overlap(&mut self, collidables: &mut CollidableStorage, a: CollidableHandle, b: CollidableHandle) -> Result<bool> {
        let key = CollidablePair::new(a, b);
        let Some(mut handler) = self.pairs.remove(&key) else {
            return Ok(false);
        };

        let mut ctx = NarrowPhaseContext {
            collidables,
            factories: &mut self.factories,
            solver_queue: &mut self.solver_queue,
            config: &self.config,
            rule_calculator: self.rule_calculator,
        };
        handler.clean_up(&mut ctx, None)?;
        ctx.factories.give_back(handler)?;

        debug!("Removed pair {:?}", key);
        Ok(true)
    }

    /// Runs one step of every pair whose collision rule allows updates
    pub fn update(&mut self, collidables: &mut CollidableStorage, dt: f32) -> Result<()> {
        let mut keys: Vec<CollidablePair> = self.pairs.keys().copied().collect();
        keys.sort_unstable();

        let Self {
            pairs,
            factories,
            solver_queue,
            config,
            rule_calculator,
        } = self;
        let mut ctx = NarrowPhaseContext {
            collidables,
            factories,
            solver_queue,
            config,
            rule_calculator: *rule_calculator,
        };

        for key in keys {
            let Some(handler) = pairs.get_mut(&key) else {
                continue;
            };
            if !handler.state().collision_rule().allows_update() {
                continue;
            }
            handler.update_collision(&mut ctx, None, dt)?;
        }

        Ok(())
    }

    /// Returns the earliest time of impact, as a fraction of `dt`, of a
    /// collidable against everything it is paired with
    pub fn time_of_impact(&mut self, collidables: &CollidableStorage, requester: CollidableHandle, dt: f32) -> Result<f32> {
        if !self.config.use_ccd {
            return Ok(1.0);
        }

        let mut keys: Vec<CollidablePair> = collidables.get_collidable(requester)?.get_pairs().iter().copied().collect();
        keys.sort_unstable();

        let mut time_of_impact: f32 = 1.0;
        for key in keys {
            let Some(handler) = self.pairs.get_mut(&key) else {
                continue;
            };
            handler.update_time_of_impact(collidables, &self.config, requester, dt)?;
            time_of_impact = time_of_impact.min(handler.time_of_impact());
        }

        Ok(time_of_impact)
    }

    /// Applies queued solver additions and removals
    pub fn flush(&mut self, solver: &mut Solver) {
        solver.apply_pending(&mut self.solver_queue);
    }

    /// Pushes a collidable's current material into the constraints of its pairs
    pub fn update_material_properties(&mut self, collidables: &CollidableStorage, handle: CollidableHandle) -> Result<()> {
        for key in collidables.get_collidable(handle)?.get_pairs() {
            if let Some(handler) = self.pairs.get_mut(key) {
                handler.update_material_properties(collidables);
            }
        }
        Ok(())
    }

    /// Cleans up every pair
    pub fn clear(&mut self, collidables: &mut CollidableStorage) -> Result<()> {
        let mut keys: Vec<CollidablePair> = self.pairs.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            self.remove_overlap(collidables, key.collidable_a, key.collidable_b)?;
        }
        Ok(())
    }

    /// Returns the handler of a pair
    pub fn pair(&self, a: CollidableHandle, b: CollidableHandle) -> Option<&dyn PairHandler> {
        self.pairs.get(&CollidablePair::new(a, b)).map(|handler| &**handler)
    }

    /// Returns the number of top-level pairs
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Returns the solver changes waiting for the next flush
    pub fn get_solver_queue(&self) -> &SolverQueue {
        &self.solver_queue
    }

    /// Returns the configuration
    pub fn get_config(&self) -> &NarrowPhaseConfig {
        &self.config
    }

    /// Returns the pair handler factories
    pub fn get_factories(&self) -> &PairFactories {
        &self.factories
    }

    /// Returns the pair handler factories for modification
    pub fn get_factories_mut(&mut self) -> &mut PairFactories {
        &mut self.factories
    }
}
