//! Interpolation trait shared by poses and keyframe tracks.
//!
//! ```
//! use rhizome_stride_rig::Lerp;
//! use glam::Vec3;
//!
//! let a = Vec3::ZERO;
//! let b = Vec3::ONE;
//! let mid = a.lerp_to(&b, 0.5);
//! assert!((mid - Vec3::splat(0.5)).length() < 0.001);
//! ```

use glam::{Quat, Vec3};

/// Trait for types that support interpolation.
///
/// Rotations interpolate spherically, everything else linearly.
pub trait Lerp {
    /// Interpolates from `self` to `other` by factor `t`.
    ///
    /// - `t = 0.0` returns `self`
    /// - `t = 1.0` returns `other`
    fn lerp_to(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl Lerp for Quat {
    #[inline]
    fn lerp_to(&self, other: &Self, t: f32) -> Self {
        self.slerp(*other, t)
    }
}

/// Returns `q` or `-q`, whichever lies in the same hemisphere as `reference`.
///
/// `q` and `-q` encode the same rotation; storing the wrong sign next to a
/// neighbouring key makes interpolation take the long way around.
#[inline]
pub fn align_hemisphere(reference: Quat, q: Quat) -> Quat {
    if reference.dot(q) < 0.0 { -q } else { q }
}

/// Aligns every rotation with its predecessor, in place.
pub fn align_sequence(rotations: &mut [Quat]) {
    for i in 1..rotations.len() {
        rotations[i] = align_hemisphere(rotations[i - 1], rotations[i]);
    }
}
