use crate::collidables::Material;
use crate::collision::{CollidablePair, Contact, ContactId};

/// A contact as held by the solver, with its accumulated impulses
#[derive(Debug, Clone, Copy)]
pub struct ConstraintContact {
    /// The contact geometry
    pub contact: Contact,

    /// Impulse accumulated along the normal
    pub normal_impulse: f32,

    /// Impulse accumulated by friction
    pub friction_impulse: f32,
}

/// The solver-side constraint of one contact manifold
///
/// A constraint with no pair is orphaned: its handler let go of it while the
/// solver still referenced it, and it is cleaned up once the solver removes it.
#[derive(Debug, Default)]
pub struct ContactManifoldConstraint {
    pair: Option<CollidablePair>,
    contacts: Vec<ConstraintContact>,
    friction: f32,
    restitution: f32,
    in_solver: bool,
}

impl ContactManifoldConstraint {
    /// Creates a new unbound constraint
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the constraint to a pair, clearing any previous state
    pub fn initialize(&mut self, pair: CollidablePair) {
        self.pair = Some(pair);
        self.contacts.clear();
        self.friction = 0.0;
        self.restitution = 0.0;
    }

    /// Returns the pair this constraint belongs to
    pub fn get_pair(&self) -> Option<CollidablePair> {
        self.pair
    }

    /// Whether the owning handler has let go of this constraint
    pub fn is_orphaned(&self) -> bool {
        self.pair.is_none()
    }

    /// Detaches the constraint from its handler
    pub fn orphan(&mut self) {
        self.pair = None;
    }

    /// Whether the solver currently holds this constraint
    pub fn is_in_solver(&self) -> bool {
        self.in_solver
    }

    pub(crate) fn set_in_solver(&mut self, in_solver: bool) {
        self.in_solver = in_solver;
    }

    /// Starts tracking a new contact with zero impulses
    pub fn add_contact(&mut self, contact: Contact) {
        self.contacts.push(ConstraintContact {
            contact,
            normal_impulse: 0.0,
            friction_impulse: 0.0,
        });
    }

    /// Stops tracking a contact, returning whether it was tracked
    pub fn remove_contact(&mut self, id: &ContactId) -> bool {
        match self.contacts.iter().position(|c| c.contact.id == *id) {
            Some(index) => {
                self.contacts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Refreshes the geometry of tracked contacts, keeping their impulses
    pub fn sync_geometry(&mut self, contacts: &[Contact]) {
        for tracked in &mut self.contacts {
            if let Some(current) = contacts.iter().find(|c| c.id == tracked.contact.id) {
                tracked.contact = *current;
            }
        }
    }

    /// Recomputes the blended friction and restitution
    pub fn update_material_properties(&mut self, material_a: &Material, material_b: &Material) {
        let blended = Material::blend(material_a, material_b);
        self.friction = blended.friction;
        self.restitution = blended.restitution;
    }

    /// Returns the blended friction coefficient
    pub fn get_friction(&self) -> f32 {
        self.friction
    }

    /// Returns the blended restitution coefficient
    pub fn get_restitution(&self) -> f32 {
        self.restitution
    }

    /// Returns the tracked contacts
    pub fn get_contacts(&self) -> &[ConstraintContact] {
        &self.contacts
    }

    /// Returns the accumulated normal and friction impulses of a contact
    pub fn get_impulses(&self, id: &ContactId) -> Option<(f32, f32)> {
        self.contacts
            .iter()
            .find(|c| c.contact.id == *id)
            .map(|c| (c.normal_impulse, c.friction_impulse))
    }

    /// Records impulses computed by the solver for a contact
    pub fn set_accumulated_impulses(&mut self, id: &ContactId, normal_impulse: f32, friction_impulse: f32) -> bool {
        match self.contacts.iter_mut().find(|c| c.contact.id == *id) {
            Some(tracked) => {
                tracked.normal_impulse = normal_impulse;
                tracked.friction_impulse = friction_impulse;
                true
            }
            None => false,
        }
    }

    /// Drops every reference held by the constraint
    pub fn clean_up_references(&mut self) {
        self.pair = None;
        self.contacts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollidableHandle;
    use crate::math::Vector3;

    fn contact(feature: u32) -> Contact {
        Contact {
            id: ContactId {
                pair: CollidablePair::new(CollidableHandle(1), CollidableHandle(2)),
                feature,
            },
            position: Vector3::zeros(),
            normal: Vector3::y(),
            penetration_depth: 0.01,
        }
    }

    #[test]
    fn impulses_survive_geometry_sync() {
        let mut constraint = ContactManifoldConstraint::new();
        constraint.initialize(CollidablePair::new(CollidableHandle(1), CollidableHandle(2)));
        constraint.add_contact(contact(3));
        assert!(constraint.set_accumulated_impulses(&contact(3).id, 2.0, 0.5));

        let mut moved = contact(3);
        moved.position = Vector3::new(0.0, 0.1, 0.0);
        constraint.sync_geometry(&[moved]);

        assert_eq!(constraint.get_impulses(&moved.id), Some((2.0, 0.5)));
        assert_eq!(constraint.get_contacts()[0].contact.position, moved.position);
    }

    #[test]
    fn blends_materials() {
        let mut constraint = ContactManifoldConstraint::new();
        constraint.update_material_properties(&Material::new(0.2, 0.1), &Material::new(0.6, 0.7));
        assert!((constraint.get_friction() - 0.4).abs() < 1.0e-6);
        assert!((constraint.get_restitution() - 0.7).abs() < 1.0e-6);
    }
}
