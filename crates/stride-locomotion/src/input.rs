//! Per-tick data exchanged with the host.

use rhizome_stride_rig::Pose;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::foot_config::Side;

/// Actual pose of one foot end effector as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FootInput {
    /// Where the host currently has the foot.
    pub pose: Pose,
    /// Set while something other than locomotion moves the foot (e.g. a user drag).
    pub overridden: bool,
}

impl FootInput {
    /// A foot the host is not overriding.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            overridden: false,
        }
    }

    /// A foot the host is moving itself.
    pub fn overridden(pose: Pose) -> Self {
        Self {
            pose,
            overridden: true,
        }
    }
}

/// Tracking data for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingInput {
    /// Head pose.
    pub head: Pose,
    /// Hip pose, if the host tracks the hip. Its height replaces the
    /// head-derived hip height estimate.
    pub hip: Option<Pose>,
    /// Left foot.
    pub left_foot: FootInput,
    /// Right foot.
    pub right_foot: FootInput,
}

impl TrackingInput {
    /// Input with only a head pose; no tracked hip, feet at the origin and not overridden.
    pub fn from_head(head: Pose) -> Self {
        Self {
            head,
            ..Self::default()
        }
    }

    /// Adds a tracked hip pose.
    pub fn with_hip(mut self, hip: Pose) -> Self {
        self.hip = Some(hip);
        self
    }

    /// Tracked hip height, if the hip is tracked and its pose is finite.
    pub fn hip_height(&self) -> Option<f32> {
        self.hip.filter(Pose::is_finite).map(|hip| hip.position.y)
    }

    /// Foot input for `side`.
    pub fn foot(&self, side: Side) -> &FootInput {
        match side {
            Side::Left => &self.left_foot,
            Side::Right => &self.right_foot,
        }
    }
}

/// Poses to apply to the rig after a physics tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigTargets {
    /// Desired hip pose.
    pub hip: Pose,
    /// Desired left foot pose.
    pub left_foot: Pose,
    /// Desired right foot pose.
    pub right_foot: Pose,
}

impl RigTargets {
    /// Target for the foot on `side`.
    pub fn foot(&self, side: Side) -> Pose {
        match side {
            Side::Left => self.left_foot,
            Side::Right => self.right_foot,
        }
    }
}
