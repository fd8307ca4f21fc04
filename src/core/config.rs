use crate::math::BIG_EPSILON;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the narrow phase
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NarrowPhaseConfig {
    /// Maximum number of contacts a single manifold keeps
    pub max_contacts: usize,

    /// Separation below which a speculative contact is still generated
    pub contact_margin: f32,

    /// Maximum drift for a contact to keep its identity between updates
    pub persistence_threshold: f32,

    /// Scales the minimum radius used by continuous collision detection
    pub core_shape_scaling: f32,

    /// Minimum time of impact accepted by a sweep
    pub toi_epsilon: f32,

    /// Whether to use continuous collision detection
    pub use_ccd: bool,
}

impl Default for NarrowPhaseConfig {
    fn default() -> Self {
        Self {
            max_contacts: 4,
            contact_margin: 0.01,
            persistence_threshold: 0.2,
            core_shape_scaling: 0.8,
            toi_epsilon: BIG_EPSILON,
            use_ccd: true,
        }
    }
}

impl NarrowPhaseConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with continuous collision detection disabled
    pub fn discrete() -> Self {
        Self {
            use_ccd: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of contacts per manifold
    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts.max(1);
        self
    }

    /// Sets the speculative contact margin
    pub fn with_contact_margin(mut self, margin: f32) -> Self {
        self.contact_margin = margin.max(0.0);
        self
    }

    /// Sets the core shape scaling used by continuous collision detection
    pub fn with_core_shape_scaling(mut self, scaling: f32) -> Self {
        self.core_shape_scaling = scaling.clamp(0.0, 1.0);
        self
    }
}
