pub mod config;
pub mod storage;
pub mod events;
pub mod pool;

pub use self::config::NarrowPhaseConfig;
pub use self::storage::{CollidableStorage, Storage};
pub use self::events::{CollidableEvents, CollisionEvent, CollisionEventListener, CollisionEventType, EventQueue};
pub use self::pool::ResourcePool;

/// A unique identifier for a collidable; the default handle (0) refers to nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CollidableHandle(pub(crate) u32);

impl CollidableHandle {
    /// Returns the raw id of this handle
    pub fn id(&self) -> u32 {
        self.0
    }
}
