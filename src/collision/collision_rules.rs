use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// A bit mask representing a collision group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT    = 0x00000001;

        /// Static world objects
        const STATIC     = 0x00000002;

        /// Dynamic objects
        const DYNAMIC    = 0x00000004;

        /// Kinematic objects
        const KINEMATIC  = 0x00000008;

        /// Character objects
        const CHARACTER  = 0x00000010;

        /// Projectile objects
        const PROJECTILE = 0x00000020;

        /// Sensor/trigger objects (detect but don't resolve)
        const SENSOR     = 0x00000040;

        /// Terrain and other large static geometry
        const TERRAIN    = 0x00000080;

        /// All groups
        const ALL        = 0xFFFFFFFF;
    }
}

impl Default for CollisionGroup {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Type alias for a collision mask (what groups this object collides with)
pub type CollisionMask = CollisionGroup;

/// How far a pair of collidables is processed, from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CollisionRule {
    /// No personal preference; resolves to `Normal`
    #[default]
    Defer,

    /// Full processing: contacts, events and solver constraints
    Normal,

    /// Contacts and events are produced, but no constraint reaches the solver
    NoSolver,

    /// The pair handler exists but is not updated
    NoNarrowPhaseUpdate,

    /// No pair handler is created
    NoNarrowPhasePair,

    /// The pair is rejected before the narrow phase
    NoBroadPhase,
}

impl CollisionRule {
    /// Whether a pair handler may exist under this rule
    pub fn allows_pair(self) -> bool {
        self < CollisionRule::NoNarrowPhasePair
    }

    /// Whether an existing pair handler is updated under this rule
    pub fn allows_update(self) -> bool {
        self < CollisionRule::NoNarrowPhaseUpdate
    }

    /// Whether constraints may be handed to the solver under this rule
    pub fn allows_solver(self) -> bool {
        self < CollisionRule::NoSolver
    }
}

/// The collision rules attached to a collidable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionRules {
    /// This collidable's own rule
    pub personal: CollisionRule,

    /// The groups this collidable belongs to
    pub group: CollisionGroup,

    /// The groups this collidable collides with
    pub mask: CollisionMask,
}

impl CollisionRules {
    /// Creates rules with a personal rule and the default group/mask
    pub fn new(personal: CollisionRule) -> Self {
        Self {
            personal,
            group: CollisionGroup::DEFAULT,
            mask: CollisionMask::ALL,
        }
    }

    /// Creates rules with a group and mask
    pub fn with_group(group: CollisionGroup, mask: CollisionMask) -> Self {
        Self {
            personal: CollisionRule::Defer,
            group,
            mask,
        }
    }
}

impl Default for CollisionRules {
    fn default() -> Self {
        Self::new(CollisionRule::Defer)
    }
}

/// Resolves the rule that applies to a pair from both sides' rules
pub type CollisionRuleCalculator = fn(&CollisionRules, &CollisionRules) -> CollisionRule;

/// The default resolver
///
/// Pairs whose groups are not in each other's mask are rejected outright.
/// Otherwise the most restrictive personal rule wins, with `Defer` resolving
/// to `Normal`.
pub fn default_collision_rule_calculator(a: &CollisionRules, b: &CollisionRules) -> CollisionRule {
    if !a.group.intersects(b.mask) || !b.group.intersects(a.mask) {
        return CollisionRule::NoBroadPhase;
    }

    match a.personal.max(b.personal) {
        CollisionRule::Defer => CollisionRule::Normal,
        rule => rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defer_resolves_to_normal() {
        let rules = CollisionRules::default();
        assert_eq!(default_collision_rule_calculator(&rules, &rules), CollisionRule::Normal);
    }

    #[test]
    fn most_restrictive_personal_rule_wins() {
        let a = CollisionRules::new(CollisionRule::NoSolver);
        let b = CollisionRules::new(CollisionRule::Normal);
        assert_eq!(default_collision_rule_calculator(&a, &b), CollisionRule::NoSolver);
        assert_eq!(default_collision_rule_calculator(&b, &a), CollisionRule::NoSolver);
    }

    #[test]
    fn group_mask_mismatch_rejects_pair() {
        let a = CollisionRules::with_group(CollisionGroup::DYNAMIC, CollisionGroup::STATIC);
        let b = CollisionRules::with_group(CollisionGroup::DYNAMIC, CollisionGroup::ALL);
        let rule = default_collision_rule_calculator(&a, &b);
        assert_eq!(rule, CollisionRule::NoBroadPhase);
        assert!(!rule.allows_pair());
    }
}
