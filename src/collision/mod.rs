mod collision_pair;
mod collision_rules;
mod contact;
mod contact_manifold;
mod terrain_convex_manifold;
mod convex_manifold;
mod pair_handler;
mod standard_pair;
mod compound_pair;
mod pair_factory;
mod narrow_phase;
pub mod geometry;
pub mod continuous;

pub use self::collision_pair::{BroadPhaseOverlap, CollidablePair, PairSignature};
pub use self::collision_rules::{
    default_collision_rule_calculator, CollisionGroup, CollisionMask, CollisionRule, CollisionRuleCalculator,
    CollisionRules,
};
pub use self::contact::{Contact, ContactChange, ContactId, ContactInformation};
pub use self::contact_manifold::{ContactManifold, PairManifold};
pub use self::terrain_convex_manifold::TerrainConvexManifold;
pub use self::convex_manifold::ConvexManifold;
pub use self::pair_handler::{NarrowPhaseContext, PairHandler, PairHandlerParent, PairHandlerState, PairHandlerStatus};
pub use self::standard_pair::{ConvexPairHandler, ManifoldPairHandler, TerrainConvexPairHandler};
pub use self::compound_pair::{
    CompoundConvexPairHandler, CompoundLink, CompoundPairHandler, CompoundPartner, CompoundTerrainPairHandler,
    ConvexPartner, ParentChain, TerrainPartner,
};
pub use self::pair_factory::{PairFactories, PairFactory, PooledPairFactory};
pub use self::narrow_phase::NarrowPhase;
