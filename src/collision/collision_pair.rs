use crate::collidables::CollidableType;
use crate::collision::CollisionRule;
use crate::core::CollidableHandle;

/// An unordered pair of collidables, used as a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollidablePair {
    /// The collidable with the lower handle
    pub collidable_a: CollidableHandle,

    /// The collidable with the higher handle
    pub collidable_b: CollidableHandle,
}

impl CollidablePair {
    /// Creates a new collidable pair
    pub fn new(a: CollidableHandle, b: CollidableHandle) -> Self {
        // Always sort the handles to ensure consistent ordering
        if a <= b {
            Self { collidable_a: a, collidable_b: b }
        } else {
            Self { collidable_a: b, collidable_b: a }
        }
    }

    /// Checks if this pair contains the specified collidable
    pub fn contains(&self, collidable: CollidableHandle) -> bool {
        self.collidable_a == collidable || self.collidable_b == collidable
    }

    /// Returns the other collidable in the pair
    pub fn other(&self, collidable: CollidableHandle) -> Option<CollidableHandle> {
        if self.collidable_a == collidable {
            Some(self.collidable_b)
        } else if self.collidable_b == collidable {
            Some(self.collidable_a)
        } else {
            None
        }
    }
}

/// The kinds of the two collidables of a pair, used to pick a factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairSignature {
    pub type_a: CollidableType,
    pub type_b: CollidableType,
}

impl PairSignature {
    /// Creates an order-independent signature
    pub fn new(a: CollidableType, b: CollidableType) -> Self {
        if a <= b {
            Self { type_a: a, type_b: b }
        } else {
            Self { type_a: b, type_b: a }
        }
    }
}

/// An overlap reported by the broad phase, as seen by a pair handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadPhaseOverlap {
    /// The first entry, as reported
    pub entry_a: CollidableHandle,

    /// The second entry, as reported
    pub entry_b: CollidableHandle,

    /// The rule that governs how far the pair is processed
    pub collision_rule: CollisionRule,
}

impl BroadPhaseOverlap {
    /// Creates a new overlap record
    pub fn new(entry_a: CollidableHandle, entry_b: CollidableHandle, collision_rule: CollisionRule) -> Self {
        Self {
            entry_a,
            entry_b,
            collision_rule,
        }
    }

    /// Returns the order-independent key of this overlap
    pub fn pair(&self) -> CollidablePair {
        CollidablePair::new(self.entry_a, self.entry_b)
    }
}
