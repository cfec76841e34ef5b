//! Rig primitives for procedural locomotion.
//!
//! Provides poses, interpolation, keyframe sampling, bone chains and the body
//! measurements derived from them.

mod error;
mod keyframe;
mod lerp;
mod measurements;
mod pose;
mod skeleton;

pub use error::RigError;
pub use keyframe::{Keyframe, first_unordered, sample_keyframes};
pub use lerp::{Lerp, align_hemisphere, align_sequence};
pub use measurements::BodyMeasurements;
pub use pose::{
    DEGENERATE_LENGTH_SQUARED, Pose, floor_projection, planar_direction, planar_distance,
    yaw_rotation,
};
pub use skeleton::{Bone, BoneId, Skeleton};
