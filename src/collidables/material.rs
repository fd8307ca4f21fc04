#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Surface properties of a collidable
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution (bounciness), 0-1
    pub restitution: f32,

    /// Coefficient of friction, 0-1
    pub friction: f32,

    /// Rolling friction coefficient
    pub rolling_friction: f32,
}

impl Material {
    /// Creates a new material with the specified properties
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
            rolling_friction: 0.0,
        }
    }

    /// Blends two materials for a contact between them
    ///
    /// Friction is averaged and restitution takes the bouncier of the two.
    pub fn blend(a: &Material, b: &Material) -> Material {
        Material {
            friction: (a.friction + b.friction) * 0.5,
            restitution: a.restitution.max(b.restitution),
            rolling_friction: (a.rolling_friction + b.rolling_friction) * 0.5,
        }
    }

    /// Creates a material for ice (low friction, high restitution)
    pub fn ice() -> Self {
        Self {
            friction: 0.05,
            restitution: 0.4,
            rolling_friction: 0.01,
        }
    }

    /// Creates a material for rubber (high friction, high restitution)
    pub fn rubber() -> Self {
        Self {
            friction: 0.8,
            restitution: 0.7,
            rolling_friction: 0.2,
        }
    }

    /// Creates a material for concrete (high friction, low restitution)
    pub fn concrete() -> Self {
        Self {
            friction: 0.9,
            restitution: 0.1,
            rolling_friction: 0.4,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.3,
            rolling_friction: 0.1,
        }
    }
}
