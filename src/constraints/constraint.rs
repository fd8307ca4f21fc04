use crate::constraints::{ConstraintGroup, ContactManifoldConstraint};
use parking_lot::Mutex;
use std::sync::Arc;

/// A contact constraint shared between its pair handler and the solver
pub type SharedContactConstraint = Arc<Mutex<ContactManifoldConstraint>>;

/// A constraint group shared between its pair handler and the solver
pub type SharedConstraintGroup = Arc<Mutex<ConstraintGroup>>;

/// Something the solver can hold and iterate
///
/// Equality is identity: two updateables are equal when they share the same
/// allocation.
#[derive(Debug, Clone)]
pub enum SolverUpdateable {
    Contact(SharedContactConstraint),
    Group(SharedConstraintGroup),
}

impl SolverUpdateable {
    /// Whether the owning handler has let go of this updateable
    pub fn is_orphaned(&self) -> bool {
        match self {
            Self::Contact(constraint) => constraint.lock().is_orphaned(),
            Self::Group(group) => group.lock().is_orphaned(),
        }
    }

    /// Whether the solver currently holds this updateable
    pub fn is_in_solver(&self) -> bool {
        match self {
            Self::Contact(constraint) => constraint.lock().is_in_solver(),
            Self::Group(group) => group.lock().is_in_solver(),
        }
    }

    pub(crate) fn set_in_solver(&self, in_solver: bool) {
        match self {
            Self::Contact(constraint) => constraint.lock().set_in_solver(in_solver),
            Self::Group(group) => group.lock().set_in_solver(in_solver),
        }
    }

    /// Whether this is a group with no members
    pub fn is_empty_group(&self) -> bool {
        match self {
            Self::Contact(_) => false,
            Self::Group(group) => group.lock().is_empty(),
        }
    }

    /// Drops every reference held by the updateable
    pub fn clean_up_references(&self) {
        match self {
            Self::Contact(constraint) => constraint.lock().clean_up_references(),
            Self::Group(group) => group.lock().clean_up_references(),
        }
    }

    /// Visits every contact constraint in this updateable, descending into groups
    pub fn for_each_contact_constraint(&self, visit: &mut dyn FnMut(&SharedContactConstraint)) {
        match self {
            Self::Contact(constraint) => visit(constraint),
            Self::Group(group) => {
                for member in group.lock().get_updateables() {
                    member.for_each_contact_constraint(visit);
                }
            }
        }
    }

    /// Returns the number of contacts held by this updateable
    pub fn contact_count(&self) -> usize {
        let mut count = 0;
        self.for_each_contact_constraint(&mut |constraint: &SharedContactConstraint| {
            count += constraint.lock().get_contacts().len()
        });
        count
    }
}

impl PartialEq for SolverUpdateable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Contact(a), Self::Contact(b)) => Arc::ptr_eq(a, b),
            (Self::Group(a), Self::Group(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for SolverUpdateable {}
