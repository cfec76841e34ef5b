//! Five-key trajectory of one step.

use rhizome_stride_rig::{Keyframe, Pose, align_hemisphere, first_unordered, sample_keyframes};

use crate::error::LocomotionError;

/// Number of keys in a step.
pub const PATH_KEYS: usize = 5;

/// Named key positions within a [`FootPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPhase {
    /// Where the foot rests before lifting.
    Start = 0,
    /// Heel leaves the floor, toe still down.
    ToeOff = 1,
    /// Highest point of the swing.
    MidSwing = 2,
    /// Heel about to touch down.
    HeelStrike = 3,
    /// Where the foot rests after the step.
    Landing = 4,
}

/// A step trajectory: five timed poses, sampled piecewise.
///
/// Times strictly increase from `0` at [`StepPhase::Start`]; the duration is
/// the landing key's time. Rotations are stored hemisphere-aligned with their
/// predecessor so slerp never takes the long way around.
#[derive(Debug, Clone, PartialEq)]
pub struct FootPath {
    keys: [Keyframe<Pose>; PATH_KEYS],
}

impl FootPath {
    /// Builds a path, rejecting keys whose times do not strictly increase.
    pub fn try_new(keys: [Keyframe<Pose>; PATH_KEYS]) -> Result<Self, LocomotionError> {
        if let Some(index) = first_unordered(&keys) {
            return Err(LocomotionError::PathTimesNotIncreasing { index });
        }
        Ok(Self::from_ordered(keys))
    }

    /// Builds a path from keys already known to be ordered.
    pub(crate) fn from_ordered(mut keys: [Keyframe<Pose>; PATH_KEYS]) -> Self {
        debug_assert!(first_unordered(&keys).is_none());
        for i in 1..PATH_KEYS {
            let previous = keys[i - 1].value.rotation;
            let rotation = &mut keys[i].value.rotation;
            *rotation = align_hemisphere(previous, *rotation);
        }
        Self { keys }
    }

    /// All keys in time order.
    pub fn keyframes(&self) -> &[Keyframe<Pose>; PATH_KEYS] {
        &self.keys
    }

    /// Key for a phase.
    pub fn key(&self, phase: StepPhase) -> &Keyframe<Pose> {
        &self.keys[phase as usize]
    }

    /// Pose before the step.
    pub fn start(&self) -> Pose {
        self.keys[0].value
    }

    /// Pose after the step.
    pub fn end(&self) -> Pose {
        self.keys[PATH_KEYS - 1].value
    }

    /// Time of the landing key.
    pub fn duration(&self) -> f32 {
        self.keys[PATH_KEYS - 1].time
    }

    /// Pose at `time`, clamped to the path.
    ///
    /// Returns the start pose exactly at or before the first key and the
    /// landing pose exactly at or after the last.
    pub fn sample(&self, time: f32) -> Pose {
        sample_keyframes(&self.keys, time).unwrap_or_else(|| self.end())
    }
}
