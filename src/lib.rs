pub mod math;
pub mod core;
pub mod collidables;
pub mod shapes;
pub mod collision;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{CollidableHandle, CollidableStorage, NarrowPhaseConfig};
pub use crate::collidables::{Collidable, Material};
pub use crate::collision::{NarrowPhase, PairHandler};
pub use crate::constraints::Solver;
pub use crate::math::Vector3;

/// Error types for the narrow phase
pub mod error {
    use crate::collision::PairSignature;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Inappropriate pair types: {0}")]
        InappropriatePairTypes(String),

        #[error("No pair handler registered for {0:?}")]
        NoPairHandler(PairSignature),

        #[error("Pair handler returned to a factory of another type")]
        FactoryMismatch,

        #[error("Pair handler is not bound")]
        HandlerNotBound,

        #[error("Pair handler is already bound")]
        HandlerAlreadyBound,

        #[error("Pair handler released while still bound")]
        HandlerStillBound,

        #[error("Contact index {index} out of range ({count} contacts)")]
        ContactIndexOutOfRange { index: usize, count: usize },
    }
}

/// Result type for narrow phase operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
