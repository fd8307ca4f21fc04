use crate::collision::CollidablePair;
use crate::math::Vector3;

/// Identifies a contact within its manifold across updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactId {
    /// The pair whose manifold owns the contact
    pub pair: CollidablePair,

    /// The sub-shape feature that produced the contact
    pub feature: u32,
}

/// A contact point between two collidables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The identity of the contact
    pub id: ContactId,

    /// The position of the contact point in world space
    pub position: Vector3,

    /// The contact normal, pointing from the first entry toward the second
    pub normal: Vector3,

    /// The penetration depth; negative for speculative contacts
    pub penetration_depth: f32,
}

/// A change to a manifold's contact set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactChange {
    Added(Contact),
    Removed(Contact),
}

/// A contact together with the solver's view of it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInformation {
    /// The contact itself
    pub contact: Contact,

    /// Impulse accumulated along the normal by the solver
    pub normal_impulse: f32,

    /// Impulse accumulated by friction by the solver
    pub friction_impulse: f32,

    /// Velocity of the second entry relative to the first at the contact point
    pub relative_velocity: Vector3,
}
