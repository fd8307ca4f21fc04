mod constraint;
mod contact_constraint;
mod constraint_group;
mod solver;

pub use self::constraint::{SharedConstraintGroup, SharedContactConstraint, SolverUpdateable};
pub use self::contact_constraint::{ConstraintContact, ContactManifoldConstraint};
pub use self::constraint_group::ConstraintGroup;
pub use self::solver::{Solver, SolverQueue};
