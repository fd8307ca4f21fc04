use crate::collision::CollidablePair;
use crate::constraints::SolverUpdateable;

/// A set of solver updateables that enters and leaves the solver as one unit
///
/// Composite pair handlers collect the constraints of their children here.
#[derive(Debug, Default)]
pub struct ConstraintGroup {
    owner: Option<CollidablePair>,
    updateables: Vec<SolverUpdateable>,
    in_solver: bool,
}

impl ConstraintGroup {
    /// Creates a new empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the group to the pair that owns it
    pub fn initialize(&mut self, owner: CollidablePair) {
        self.owner = Some(owner);
        self.updateables.clear();
    }

    /// Returns the pair that owns this group
    pub fn get_owner(&self) -> Option<CollidablePair> {
        self.owner
    }

    /// Whether the owning handler has let go of this group
    pub fn is_orphaned(&self) -> bool {
        self.owner.is_none()
    }

    /// Detaches the group from its handler
    pub fn orphan(&mut self) {
        self.owner = None;
    }

    /// Whether the solver currently holds this group
    pub fn is_in_solver(&self) -> bool {
        self.in_solver
    }

    pub(crate) fn set_in_solver(&mut self, in_solver: bool) {
        self.in_solver = in_solver;
    }

    /// Adds an updateable to the group, returning whether it was not already present
    pub fn add(&mut self, updateable: SolverUpdateable) -> bool {
        if self.updateables.contains(&updateable) {
            return false;
        }
        self.updateables.push(updateable);
        true
    }

    /// Removes an updateable from the group, returning whether it was present
    pub fn remove(&mut self, updateable: &SolverUpdateable) -> bool {
        match self.updateables.iter().position(|u| u == updateable) {
            Some(index) => {
                self.updateables.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the updateables in the group
    pub fn get_updateables(&self) -> &[SolverUpdateable] {
        &self.updateables
    }

    /// Returns the number of updateables in the group
    pub fn len(&self) -> usize {
        self.updateables.len()
    }

    /// Returns whether the group is empty
    pub fn is_empty(&self) -> bool {
        self.updateables.is_empty()
    }

    /// Drops every reference held by the group
    pub fn clean_up_references(&mut self) {
        self.owner = None;
        self.updateables.clear();
    }
}
