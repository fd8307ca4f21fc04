use crate::collision::geometry::ContactGeometry;
use crate::collision::{CollidablePair, Contact, ContactChange, ContactId, PairSignature};
use crate::core::{CollidableHandle, CollidableStorage, NarrowPhaseConfig};
use crate::Result;
use std::fmt::Debug;

/// A per-pair-type contact generation algorithm
///
/// A manifold is bound between `initialize` and `clean_up`. Each `update`
/// recomputes the contact set and appends the additions and removals it made
/// to `changes`, in the order they happened.
pub trait PairManifold: Debug + Default + Send + 'static {
    /// The kinds of collidable this manifold handles
    fn signature() -> PairSignature;

    /// Checks the entry kinds and puts them in the order the manifold expects
    fn order_entries(
        collidables: &CollidableStorage,
        a: CollidableHandle,
        b: CollidableHandle,
    ) -> Result<(CollidableHandle, CollidableHandle)>;

    /// Binds the manifold to two ordered entries
    fn initialize(&mut self, entry_a: CollidableHandle, entry_b: CollidableHandle);

    /// Recomputes the contact set
    fn update(
        &mut self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        dt: f32,
        changes: &mut Vec<ContactChange>,
    ) -> Result<()>;

    /// Returns the current contacts
    fn get_contacts(&self) -> &[Contact];

    /// Removes every contact, last first, and unbinds the manifold
    fn clean_up(&mut self, changes: &mut Vec<ContactChange>);

    /// Computes the fraction of the step at which the pair first touches
    fn time_of_impact(
        &self,
        collidables: &CollidableStorage,
        config: &NarrowPhaseConfig,
        requester: CollidableHandle,
        dt: f32,
    ) -> Result<f32>;
}

/// Persistent contact storage shared by the manifold implementations
///
/// Candidates gathered during an update are reduced to the deepest few and
/// matched against the existing contacts by feature and position, so that a
/// contact keeps its identity (and the solver its impulses) while it persists.
#[derive(Debug, Default)]
pub struct ContactManifold {
    pair: Option<CollidablePair>,
    contacts: Vec<Contact>,
    candidates: Vec<Contact>,
}

impl ContactManifold {
    /// Creates a new unbound manifold
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the manifold to a pair
    pub fn initialize(&mut self, pair: CollidablePair) {
        self.pair = Some(pair);
        self.contacts.clear();
        self.candidates.clear();
    }

    /// Returns the pair this manifold is bound to
    pub fn get_pair(&self) -> Option<CollidablePair> {
        self.pair
    }

    /// Returns the current contacts
    pub fn get_contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Starts gathering candidates for a new update
    pub fn begin_update(&mut self) {
        self.candidates.clear();
    }

    /// Offers a candidate contact produced by a sub-shape feature
    pub fn add_candidate(&mut self, feature: u32, geometry: ContactGeometry) {
        let Some(pair) = self.pair else {
            return;
        };
        self.candidates.push(Contact {
            id: ContactId { pair, feature },
            position: geometry.position,
            normal: geometry.normal,
            penetration_depth: geometry.depth,
        });
    }

    /// Replaces the contact set with the gathered candidates
    pub fn finish_update(&mut self, config: &NarrowPhaseConfig, changes: &mut Vec<ContactChange>) {
        let threshold_squared = config.persistence_threshold * config.persistence_threshold;

        // Stable, so equally deep candidates keep their feature order
        self.candidates
            .sort_by(|a, b| b.penetration_depth.total_cmp(&a.penetration_depth));

        let mut accepted: Vec<Contact> = Vec::with_capacity(config.max_contacts);
        for candidate in self.candidates.drain(..) {
            if accepted.len() >= config.max_contacts {
                break;
            }
            let redundant = accepted
                .iter()
                .any(|c| (c.position - candidate.position).norm_squared() < threshold_squared);
            if !redundant {
                accepted.push(candidate);
            }
        }

        let mut matched = vec![false; accepted.len()];
        for i in (0..self.contacts.len()).rev() {
            let existing = self.contacts[i];
            let found = accepted.iter().enumerate().position(|(j, c)| {
                !matched[j]
                    && c.id == existing.id
                    && (c.position - existing.position).norm_squared() <= threshold_squared
            });

            match found {
                Some(j) => {
                    matched[j] = true;
                    self.contacts[i] = accepted[j];
                }
                None => {
                    self.contacts.remove(i);
                    changes.push(ContactChange::Removed(existing));
                }
            }
        }

        for (contact, was_matched) in accepted.into_iter().zip(matched) {
            if !was_matched {
                self.contacts.push(contact);
                changes.push(ContactChange::Added(contact));
            }
        }
    }

    /// Removes every contact, last first, and unbinds the manifold
    pub fn clean_up(&mut self, changes: &mut Vec<ContactChange>) {
        while let Some(contact) = self.contacts.pop() {
            changes.push(ContactChange::Removed(contact));
        }
        self.candidates.clear();
        self.pair = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn geometry(x: f32, depth: f32) -> ContactGeometry {
        ContactGeometry {
            position: Vector3::new(x, 0.0, 0.0),
            normal: Vector3::y(),
            depth,
        }
    }

    fn bound_manifold() -> ContactManifold {
        let mut manifold = ContactManifold::new();
        manifold.initialize(CollidablePair::new(CollidableHandle(1), CollidableHandle(2)));
        manifold
    }

    #[test]
    fn persistent_contacts_are_not_re_added() {
        let config = NarrowPhaseConfig::default();
        let mut manifold = bound_manifold();
        let mut changes = Vec::new();

        manifold.begin_update();
        manifold.add_candidate(7, geometry(0.0, 0.05));
        manifold.finish_update(&config, &mut changes);
        assert_eq!(changes.len(), 1);

        changes.clear();
        manifold.begin_update();
        manifold.add_candidate(7, geometry(0.05, 0.06));
        manifold.finish_update(&config, &mut changes);
        assert!(changes.is_empty());
        assert_eq!(manifold.get_contacts()[0].penetration_depth, 0.06);
    }

    #[test]
    fn keeps_only_the_deepest_candidates() {
        let config = NarrowPhaseConfig::default().with_max_contacts(2);
        let mut manifold = bound_manifold();
        let mut changes = Vec::new();

        manifold.begin_update();
        manifold.add_candidate(1, geometry(0.0, 0.01));
        manifold.add_candidate(2, geometry(1.0, 0.03));
        manifold.add_candidate(3, geometry(2.0, 0.02));
        manifold.add_candidate(4, geometry(2.05, 0.025));
        manifold.finish_update(&config, &mut changes);

        let features: Vec<u32> = manifold.get_contacts().iter().map(|c| c.id.feature).collect();
        assert_eq!(features, vec![2, 4]);
    }

    #[test]
    fn drifted_contact_is_replaced() {
        let config = NarrowPhaseConfig::default();
        let mut manifold = bound_manifold();
        let mut changes = Vec::new();

        manifold.begin_update();
        manifold.add_candidate(7, geometry(0.0, 0.05));
        manifold.finish_update(&config, &mut changes);

        changes.clear();
        manifold.begin_update();
        manifold.add_candidate(7, geometry(1.0, 0.05));
        manifold.finish_update(&config, &mut changes);

        assert!(matches!(changes[0], ContactChange::Removed(_)));
        assert!(matches!(changes[1], ContactChange::Added(_)));
        assert_eq!(manifold.get_contacts().len(), 1);
    }

    #[test]
    fn clean_up_removes_last_first() {
        let config = NarrowPhaseConfig::default();
        let mut manifold = bound_manifold();
        let mut changes = Vec::new();

        manifold.begin_update();
        manifold.add_candidate(1, geometry(0.0, 0.05));
        manifold.add_candidate(2, geometry(1.0, 0.04));
        manifold.finish_update(&config, &mut changes);

        changes.clear();
        manifold.clean_up(&mut changes);
        let removed: Vec<u32> = changes
            .iter()
            .map(|change| match change {
                ContactChange::Removed(c) => c.id.feature,
                ContactChange::Added(_) => panic!("unexpected addition"),
            })
            .collect();
        assert_eq!(removed, vec![2, 1]);
        assert!(manifold.get_pair().is_none());
    }
}
