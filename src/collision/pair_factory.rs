use crate::collision::{
    BroadPhaseOverlap, CompoundConvexPairHandler, CompoundTerrainPairHandler, ConvexPairHandler, PairHandler,
    PairSignature, TerrainConvexPairHandler,
};
use crate::core::{CollidableStorage, ResourcePool};
use crate::error::PhysicsError;
use crate::Result;
use log::warn;
use std::collections::HashMap;
use std::fmt::Debug;

/// Hands out unbound pair handlers of one concrete type and takes them back
pub trait PairFactory: Debug + Send {
    /// The pair signature this factory serves
    fn signature(&self) -> PairSignature;

    /// Returns an unbound handler for an overlap, reusing a pooled one if possible
    fn acquire(&mut self, overlap: BroadPhaseOverlap) -> Box<dyn PairHandler>;

    /// Takes back a cleaned-up handler of this factory's type
    fn release(&mut self, handler: Box<dyn PairHandler>) -> Result<()>;

    /// Number of handlers waiting in the pool
    fn pooled_count(&self) -> usize;

    /// Number of handlers this factory has ever created
    fn created_count(&self) -> usize;
}

/// A factory backed by a free-list pool of `H`
#[derive(Debug)]
pub struct PooledPairFactory<H: PairHandler + Default> {
    signature: PairSignature,
    pool: ResourcePool<Box<H>>,
}

impl<H: PairHandler + Default> PooledPairFactory<H> {
    /// Creates a new factory with an empty pool
    pub fn new() -> Self {
        Self {
            signature: H::default().signature(),
            pool: ResourcePool::new(),
        }
    }
}

impl<H: PairHandler + Default> Default for PooledPairFactory<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PairHandler + Default> PairFactory for PooledPairFactory<H> {
    fn signature(&self) -> PairSignature {
        self.signature
    }

    fn acquire(&mut self, overlap: BroadPhaseOverlap) -> Box<dyn PairHandler> {
        let mut handler = self.pool.take();
        handler.state_mut().overlap = Some(overlap);
        handler
    }

    fn release(&mut self, handler: Box<dyn PairHandler>) -> Result<()> {
        if handler.state().bound {
            return Err(PhysicsError::HandlerStillBound);
        }

        match handler.into_any().downcast::<H>() {
            Ok(mut handler) => {
                handler.reset();
                self.pool.give_back(handler);
                Ok(())
            }
            Err(_) => {
                warn!("Handler returned to the {:?} factory has another type", self.signature);
                Err(PhysicsError::FactoryMismatch)
            }
        }
    }

    fn pooled_count(&self) -> usize {
        self.pool.available_count()
    }

    fn created_count(&self) -> usize {
        self.pool.created_count()
    }
}

/// The registered factories, keyed by pair signature
#[derive(Debug, Default)]
pub struct PairFactories {
    factories: HashMap<PairSignature, Box<dyn PairFactory>>,
}

impl PairFactories {
    /// Creates the factories for every supported pair of collidable kinds
    pub fn new() -> Self {
        let mut factories = Self::empty();
        factories.register(Box::new(PooledPairFactory::<ConvexPairHandler>::new()));
        factories.register(Box::new(PooledPairFactory::<TerrainConvexPairHandler>::new()));
        factories.register(Box::new(PooledPairFactory::<CompoundTerrainPairHandler>::new()));
        factories.register(Box::new(PooledPairFactory::<CompoundConvexPairHandler>::new()));
        factories
    }

    /// Creates a registry with no factories
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory, replacing any factory with the same signature
    pub fn register(&mut self, factory: Box<dyn PairFactory>) -> Option<Box<dyn PairFactory>> {
        self.factories.insert(factory.signature(), factory)
    }

    /// Returns the factory for a signature
    pub fn get_factory(&self, signature: &PairSignature) -> Option<&dyn PairFactory> {
        self.factories.get(signature).map(|factory| &**factory)
    }

    /// Returns an unbound handler suited to the kinds of the overlapping collidables
    pub fn get_pair_handler(
        &mut self,
        collidables: &CollidableStorage,
        overlap: BroadPhaseOverlap,
    ) -> Result<Box<dyn PairHandler>> {
        let signature = PairSignature::new(
            collidables.get_collidable(overlap.entry_a)?.collidable_type(),
            collidables.get_collidable(overlap.entry_b)?.collidable_type(),
        );
        let factory = self
            .factories
            .get_mut(&signature)
            .ok_or(PhysicsError::NoPairHandler(signature))?;
        Ok(factory.acquire(overlap))
    }

    /// Returns a cleaned-up handler to the factory it came from
    pub fn give_back(&mut self, handler: Box<dyn PairHandler>) -> Result<()> {
        let signature = handler.signature();
        let factory = self
            .factories
            .get_mut(&signature)
            .ok_or(PhysicsError::NoPairHandler(signature))?;
        factory.release(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collidables::CollidableType;
    use crate::collision::{CollidablePair, CollisionRule};
    use crate::core::CollidableHandle;

    fn overlap() -> BroadPhaseOverlap {
        BroadPhaseOverlap::new(CollidableHandle(1), CollidableHandle(2), CollisionRule::Normal)
    }

    #[test]
    fn released_handlers_are_reused() {
        let mut factory = PooledPairFactory::<ConvexPairHandler>::new();
        let handler = factory.acquire(overlap());
        assert_eq!(handler.state().pair(), Some(CollidablePair::new(CollidableHandle(1), CollidableHandle(2))));
        factory.release(handler).unwrap();
        assert_eq!(factory.pooled_count(), 1);

        let handler = factory.acquire(overlap());
        assert_eq!(factory.created_count(), 1);
        assert_eq!(handler.contact_count(), 0);
    }

    #[test]
    fn rejects_handlers_of_another_type() {
        let mut convex = PooledPairFactory::<ConvexPairHandler>::new();
        let mut terrain = PooledPairFactory::<TerrainConvexPairHandler>::new();
        let handler = terrain.acquire(overlap());
        assert!(matches!(convex.release(handler), Err(PhysicsError::FactoryMismatch)));
    }

    #[test]
    fn default_registry_covers_supported_kinds() {
        let factories = PairFactories::new();
        for (a, b) in [
            (CollidableType::Convex, CollidableType::Convex),
            (CollidableType::Convex, CollidableType::Terrain),
            (CollidableType::Terrain, CollidableType::Compound),
            (CollidableType::Convex, CollidableType::Compound),
        ] {
            assert!(factories.get_factory(&PairSignature::new(a, b)).is_some());
        }
        assert!(factories
            .get_factory(&PairSignature::new(CollidableType::Compound, CollidableType::Compound))
            .is_none());
    }
}
