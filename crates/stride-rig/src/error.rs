//! Error types for stride-rig.

use thiserror::Error;

/// Errors that can occur while reading rig data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// No bone with the given name exists.
    #[error("bone not found: {0}")]
    BoneNotFound(String),

    /// The chain walk from `descendant` never reached `ancestor`.
    #[error("bone {ancestor} is not an ancestor of {descendant}")]
    NotAnAncestor {
        /// Expected upper end of the chain.
        ancestor: String,
        /// Lower end of the chain.
        descendant: String,
    },

    /// A measured length is zero, negative or not finite.
    #[error("degenerate measurement for {segment}: {value}")]
    DegenerateMeasurement {
        /// Which segment was measured.
        segment: &'static str,
        /// The offending value.
        value: f32,
    },
}
