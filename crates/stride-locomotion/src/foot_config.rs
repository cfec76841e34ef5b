//! Per-foot offsets derived from the configuration.

use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{LocomotionConfig, Param};

/// Which foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// Left foot (negative X).
    Left,
    /// Right foot (positive X).
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Mirroring sign: `-1` for left, `+1` for right.
    #[inline]
    pub fn inverse(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    /// The other foot.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Body-relative placement of one foot.
///
/// Offsets are expressed in the planar heading frame of the body (+Z forward).
/// A standing foot sits at `standing_offset`; a foot landing a full walking
/// step narrows toward `walking_offset`. Both are mirrored by [`Side::inverse`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FootConfiguration {
    /// Which foot this describes.
    pub side: Side,
    /// Offset from body center when standing.
    pub standing_offset: Vec3,
    /// Offset from body center at the end of a full walking step.
    pub walking_offset: Vec3,
    /// Outward yaw when standing.
    pub standing_rotation: Quat,
    /// Outward yaw at the end of a full walking step.
    pub walking_rotation: Quat,
}

impl FootConfiguration {
    /// Derives the placement for `side` from the current parameters.
    pub fn from_config(side: Side, config: &LocomotionConfig) -> Self {
        let inverse = side.inverse();
        let forward = config.get(Param::FootForwardOffset);

        Self {
            side,
            standing_offset: Vec3::new(inverse * config.get(Param::FootSideOffset), 0.0, forward),
            walking_offset: Vec3::new(inverse * config.get(Param::WalkingSideOffset), 0.0, forward),
            standing_rotation: Quat::from_rotation_y(inverse * config.radians(Param::FootYawAngle)),
            walking_rotation: Quat::from_rotation_y(
                inverse * config.radians(Param::WalkingYawAngle),
            ),
        }
    }

    /// Offset blended by stand-to-walk ratio.
    pub fn offset(&self, stand_to_walk: f32) -> Vec3 {
        let t = stand_to_walk.clamp(0.0, 1.0);
        self.standing_offset.lerp(self.walking_offset, t)
    }

    /// Yaw blended by stand-to-walk ratio.
    pub fn rotation(&self, stand_to_walk: f32) -> Quat {
        let t = stand_to_walk.clamp(0.0, 1.0);
        self.standing_rotation.slerp(self.walking_rotation, t)
    }
}
