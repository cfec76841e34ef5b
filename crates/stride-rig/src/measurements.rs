//! Body measurements derived from bone-chain lengths.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::skeleton::Skeleton;

/// Standing dimensions of the tracked person.
///
/// Derived once from the rig and replaced wholesale when the rig changes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyMeasurements {
    floor_to_hip: f32,
    hip_to_head: f32,
}

impl Default for BodyMeasurements {
    /// Average adult proportions (1.7 m eye height).
    fn default() -> Self {
        Self {
            floor_to_hip: 0.95,
            hip_to_head: 0.75,
        }
    }
}

impl BodyMeasurements {
    /// Creates measurements from the two body segments.
    pub fn new(floor_to_hip: f32, hip_to_head: f32) -> Result<Self, RigError> {
        Ok(Self {
            floor_to_hip: validated("floor_to_hip", floor_to_hip)?,
            hip_to_head: validated("hip_to_head", hip_to_head)?,
        })
    }

    /// Sums raw segment lengths of the leg chain and the torso chain.
    pub fn from_segments(leg: &[f32], torso: &[f32]) -> Result<Self, RigError> {
        Self::new(leg.iter().sum(), torso.iter().sum())
    }

    /// Measures a skeleton: the leg chain runs from `hip` down to `foot`, the
    /// torso chain from `hip` up to `head`.
    pub fn from_skeleton(
        skeleton: &Skeleton,
        hip: &str,
        foot: &str,
        head: &str,
    ) -> Result<Self, RigError> {
        let hip = skeleton.require_bone(hip)?;
        let foot = skeleton.require_bone(foot)?;
        let head = skeleton.require_bone(head)?;

        Self::new(
            skeleton.chain_length(hip, foot)?,
            skeleton.chain_length(hip, head)?,
        )
    }

    /// Height of the hip above the floor when standing.
    pub fn floor_to_hip(&self) -> f32 {
        self.floor_to_hip
    }

    /// Distance from hip to head when standing.
    pub fn hip_to_head(&self) -> f32 {
        self.hip_to_head
    }

    /// Height of the head above the floor when standing.
    pub fn floor_to_head(&self) -> f32 {
        self.floor_to_hip + self.hip_to_head
    }
}

fn validated(segment: &'static str, value: f32) -> Result<f32, RigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RigError::DegenerateMeasurement { segment, value })
    }
}
