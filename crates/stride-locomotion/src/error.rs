//! Error types for stride-locomotion.

use rhizome_stride_rig::RigError;
use thiserror::Error;

/// Errors that can occur while configuring or building locomotion data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocomotionError {
    /// No parameter with this name exists.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A parameter edit carried NaN or infinity.
    #[error("non-finite value for parameter {name}")]
    NonFiniteValue {
        /// Parameter name.
        name: &'static str,
    },

    /// Foot path keyframe times must strictly increase.
    #[error("foot path key {index} is not later than its predecessor")]
    PathTimesNotIncreasing {
        /// Index of the offending key.
        index: usize,
    },

    /// Error from the rig layer.
    #[error("rig error: {0}")]
    Rig(#[from] RigError),
}
