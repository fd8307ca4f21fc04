use crate::constraints::{SharedContactConstraint, SolverUpdateable};
use log::trace;

/// Solver additions and removals generated during a narrow-phase update
///
/// Handlers never touch the solver directly. The driver drains this queue into
/// the solver between phases. A removal queued for an updateable that is still
/// waiting to be added cancels the addition, and the reverse.
#[derive(Debug, Default)]
pub struct SolverQueue {
    pending_additions: Vec<SolverUpdateable>,
    pending_removals: Vec<SolverUpdateable>,
}

impl SolverQueue {
    /// Creates a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that an updateable be added to the solver
    pub fn enqueue_add(&mut self, updateable: SolverUpdateable) {
        if let Some(index) = self.pending_removals.iter().position(|u| *u == updateable) {
            self.pending_removals.remove(index);
            return;
        }
        if !self.pending_additions.contains(&updateable) {
            self.pending_additions.push(updateable);
        }
    }

    /// Requests that an updateable be removed from the solver
    pub fn enqueue_remove(&mut self, updateable: SolverUpdateable) {
        if let Some(index) = self.pending_additions.iter().position(|u| *u == updateable) {
            self.pending_additions.remove(index);
            if updateable.is_orphaned() && !updateable.is_in_solver() {
                updateable.clean_up_references();
            }
            return;
        }
        if !self.pending_removals.contains(&updateable) {
            self.pending_removals.push(updateable);
        }
    }

    /// Returns the updateables waiting to be added
    pub fn get_pending_additions(&self) -> &[SolverUpdateable] {
        &self.pending_additions
    }

    /// Returns the updateables waiting to be removed
    pub fn get_pending_removals(&self) -> &[SolverUpdateable] {
        &self.pending_removals
    }

    /// Returns whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending_additions.is_empty() && self.pending_removals.is_empty()
    }
}

/// The set of updateables visible to the solver
#[derive(Debug, Default)]
pub struct Solver {
    updateables: Vec<SolverUpdateable>,
}

impl Solver {
    /// Creates a new empty solver
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies pending additions, then pending removals
    ///
    /// Orphaned updateables and empty groups are never added. Orphaned
    /// updateables have their references cleaned up once removed.
    pub fn apply_pending(&mut self, queue: &mut SolverQueue) {
        for updateable in queue.pending_additions.drain(..) {
            if updateable.is_orphaned() || updateable.is_empty_group() {
                trace!("Dropping stale solver addition");
                continue;
            }
            if self.updateables.contains(&updateable) {
                continue;
            }
            updateable.set_in_solver(true);
            self.updateables.push(updateable);
        }

        for updateable in queue.pending_removals.drain(..) {
            if let Some(index) = self.updateables.iter().position(|u| *u == updateable) {
                self.updateables.remove(index);
            }
            updateable.set_in_solver(false);
            if updateable.is_orphaned() {
                updateable.clean_up_references();
            }
        }
    }

    /// Returns whether the solver holds an updateable
    pub fn contains(&self, updateable: &SolverUpdateable) -> bool {
        self.updateables.contains(updateable)
    }

    /// Returns the updateables held by the solver
    pub fn get_updateables(&self) -> &[SolverUpdateable] {
        &self.updateables
    }

    /// Returns the number of updateables held by the solver
    pub fn len(&self) -> usize {
        self.updateables.len()
    }

    /// Returns whether the solver is empty
    pub fn is_empty(&self) -> bool {
        self.updateables.is_empty()
    }

    /// Visits every contact constraint held by the solver, including group members
    pub fn for_each_contact_constraint(&self, mut visit: impl FnMut(&SharedContactConstraint)) {
        for updateable in &self.updateables {
            updateable.for_each_contact_constraint(&mut visit);
        }
    }

    /// Returns the total number of contacts the solver would iterate
    pub fn contact_count(&self) -> usize {
        self.updateables.iter().map(SolverUpdateable::contact_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollidablePair;
    use crate::constraints::ContactManifoldConstraint;
    use crate::core::CollidableHandle;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn bound_constraint() -> SolverUpdateable {
        let mut constraint = ContactManifoldConstraint::new();
        constraint.initialize(CollidablePair::new(CollidableHandle(1), CollidableHandle(2)));
        SolverUpdateable::Contact(Arc::new(Mutex::new(constraint)))
    }

    #[test]
    fn additions_are_applied_on_flush() {
        let mut queue = SolverQueue::new();
        let mut solver = Solver::new();
        let constraint = bound_constraint();

        queue.enqueue_add(constraint.clone());
        assert!(solver.is_empty());
        solver.apply_pending(&mut queue);

        assert!(solver.contains(&constraint));
        assert!(constraint.is_in_solver());
        assert!(queue.is_empty());
    }

    #[test]
    fn removal_cancels_pending_addition() {
        let mut queue = SolverQueue::new();
        let constraint = bound_constraint();
        queue.enqueue_add(constraint.clone());
        queue.enqueue_remove(constraint.clone());
        assert!(queue.is_empty());
    }

    #[test]
    fn orphaned_constraint_is_cleaned_when_removed() {
        let mut queue = SolverQueue::new();
        let mut solver = Solver::new();
        let constraint = bound_constraint();
        queue.enqueue_add(constraint.clone());
        solver.apply_pending(&mut queue);

        if let SolverUpdateable::Contact(shared) = &constraint {
            shared.lock().orphan();
        }
        queue.enqueue_remove(constraint.clone());
        solver.apply_pending(&mut queue);

        assert!(solver.is_empty());
        assert!(!constraint.is_in_solver());
    }

    #[test]
    fn orphaned_additions_are_dropped() {
        let mut queue = SolverQueue::new();
        let mut solver = Solver::new();
        let orphan = SolverUpdateable::Contact(Arc::new(Mutex::new(ContactManifoldConstraint::new())));
        queue.enqueue_add(orphan);
        solver.apply_pending(&mut queue);
        assert!(solver.is_empty());
    }
}
