//! Rigid pose type (position + orientation) used for every tracked and driven end effector.

use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::lerp::Lerp;

/// Squared length below which a planar direction is treated as degenerate.
pub const DEGENERATE_LENGTH_SQUARED: f32 = 1e-6;

/// A position and an orientation in world space.
///
/// Y is up, +Z is forward and +X is right. The floor is the plane `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Pose at the origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a new pose.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Creates a pose with only a position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Creates a pose with only a rotation.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Combines two poses (self then other), treating `other` as local to `self`.
    pub fn then(&self, other: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Returns the inverse pose.
    pub fn inverse(&self) -> Pose {
        let inv_rotation = self.rotation.inverse();
        Pose {
            position: inv_rotation * -self.position,
            rotation: inv_rotation,
        }
    }

    /// Transforms a point from local space to world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Forward direction (+Z rotated into world space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Up direction (+Y rotated into world space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Position projected onto the floor.
    pub fn floor_position(&self) -> Vec3 {
        floor_projection(self.position)
    }

    /// Same pose with its position projected onto the floor.
    pub fn floored(&self) -> Pose {
        Pose {
            position: self.floor_position(),
            rotation: self.rotation,
        }
    }

    /// Returns true if no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }

    /// Interpolates position linearly and rotation spherically.
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }
}

impl Lerp for Pose {
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// Sets the vertical component to the floor level.
#[inline]
pub fn floor_projection(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Planar distance between two points (vertical component ignored).
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    floor_projection(a - b).length()
}

/// Projects a direction onto the floor plane and normalizes it.
///
/// Returns `None` when the projection is too short to carry a heading
/// (e.g. a vector pointing straight up or down).
pub fn planar_direction(v: Vec3) -> Option<Vec3> {
    let flat = floor_projection(v);
    if flat.length_squared() < DEGENERATE_LENGTH_SQUARED {
        None
    } else {
        Some(flat.normalize())
    }
}

/// Yaw-only rotation that turns +Z into the given planar direction.
///
/// Falls back to identity for degenerate directions.
pub fn yaw_rotation(direction: Vec3) -> Quat {
    match planar_direction(direction) {
        Some(dir) => Quat::from_rotation_y(dir.x.atan2(dir.z)),
        None => Quat::IDENTITY,
    }
}
