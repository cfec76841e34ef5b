//! Timed keyframes and piecewise sampling.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::lerp::Lerp;

/// A value at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keyframe<T> {
    /// Time in seconds.
    pub time: f32,
    /// Value at this keyframe.
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Creates a new keyframe.
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Returns the index of the first keyframe whose time does not exceed its
/// predecessor's, or `None` if times are strictly increasing.
pub fn first_unordered<T>(keyframes: &[Keyframe<T>]) -> Option<usize> {
    keyframes
        .windows(2)
        .position(|pair| !(pair[1].time > pair[0].time))
        .map(|i| i + 1)
}

/// Samples keyframes (sorted by strictly increasing time) at `time`.
///
/// Times before the first key return the first value and times after the last
/// key return the last value, both exactly. Returns `None` for an empty slice.
pub fn sample_keyframes<T: Lerp + Clone>(keyframes: &[Keyframe<T>], time: f32) -> Option<T> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    if time <= first.time {
        return Some(first.value.clone());
    }
    if time >= last.time {
        return Some(last.value.clone());
    }

    // Index of the first key strictly after `time`; always >= 1 here
    let next = keyframes.partition_point(|k| k.time <= time);
    let curr = &keyframes[next - 1];
    let next = &keyframes[next];

    let span = next.time - curr.time;
    let t = if span > 0.0 {
        (time - curr.time) / span
    } else {
        1.0
    };
    Some(curr.value.lerp_to(&next.value, t))
}
