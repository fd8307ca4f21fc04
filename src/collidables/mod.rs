mod collidable;
mod compound;
mod material;

pub use self::collidable::{Collidable, CollidableKind, CollidableType, MotionState, PositionUpdateMode};
pub use self::compound::{CompoundChild, CompoundCollidable};
pub use self::material::Material;
