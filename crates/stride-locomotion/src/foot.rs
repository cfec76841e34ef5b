//! Single-foot step planning and playback.

use glam::{Quat, Vec3};
use rhizome_stride_rig::{Keyframe, Pose, floor_projection, planar_direction};
use tracing::{debug, trace};

use crate::config::{LocomotionConfig, Param};
use crate::foot_config::{FootConfiguration, Side};
use crate::foot_path::{FootPath, PATH_KEYS, StepPhase};

/// A step in flight. The path only exists while it is being played.
#[derive(Debug, Clone)]
struct ActiveStep {
    path: FootPath,
    clock: f32,
    stand_to_walk: f32,
}

/// Drives one foot: holds its committed pose, plans steps and plays them back.
#[derive(Debug, Clone)]
pub struct FootController {
    side: Side,
    placement: FootConfiguration,
    committed: Pose,
    pose: Pose,
    step: Option<ActiveStep>,
    overridden: bool,
}

impl FootController {
    /// Creates a foot resting at the origin.
    pub fn new(side: Side, config: &LocomotionConfig) -> Self {
        Self {
            side,
            placement: FootConfiguration::from_config(side, config),
            committed: Pose::IDENTITY,
            pose: Pose::IDENTITY,
            step: None,
            overridden: false,
        }
    }

    /// Which foot this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Body-relative placement in use.
    pub fn placement(&self) -> &FootConfiguration {
        &self.placement
    }

    /// Re-derives the placement after a configuration change.
    pub fn refresh(&mut self, config: &LocomotionConfig) {
        self.placement = FootConfiguration::from_config(self.side, config);
    }

    /// Pose the foot holds this tick.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Last committed pose (the step start or the last landing).
    pub fn committed(&self) -> Pose {
        self.committed
    }

    /// Committed position.
    pub fn position(&self) -> Vec3 {
        self.committed.position
    }

    /// Committed position projected onto the floor.
    pub fn floor_position(&self) -> Vec3 {
        self.committed.floor_position()
    }

    /// Where the foot will rest once the current step lands.
    pub fn destination(&self) -> Pose {
        self.step
            .as_ref()
            .map_or(self.committed, |step| step.path.end())
    }

    /// Path of the step in flight.
    pub fn path(&self) -> Option<&FootPath> {
        self.step.as_ref().map(|step| &step.path)
    }

    /// Elapsed time into the step in flight.
    pub fn clock(&self) -> Option<f32> {
        self.step.as_ref().map(|step| step.clock)
    }

    /// Returns true while a step is being played.
    pub fn is_animating(&self) -> bool {
        self.step.is_some()
    }

    /// Returns true while the host is moving this foot.
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Ideal floor pose for this foot around `body_center`, facing `heading`.
    pub fn target_pose(&self, body_center: Vec3, heading: Quat, stand_to_walk: f32) -> Pose {
        let position = floor_projection(body_center + heading * self.placement.offset(stand_to_walk));
        Pose::new(position, heading * self.placement.rotation(stand_to_walk))
    }

    /// Plans a step from the current pose to `target`.
    ///
    /// The foot travels through toe-off, mid-swing and heel-strike keys placed
    /// at the configured time, distance and height ratios. Lift and pitch grow
    /// with `stand_to_walk`. Ignored while overridden; returns whether a step
    /// was planned.
    pub fn plot_course(&mut self, target: Pose, stand_to_walk: f32, config: &LocomotionConfig) -> bool {
        if self.overridden {
            return false;
        }

        let stand_to_walk = stand_to_walk.clamp(0.0, 1.0);
        let start = self.pose;
        let duration = config.get(Param::StepDuration);
        let lift = config.get(Param::StepHeight)
            * lerp(config.get(Param::StandingLiftRatio), 1.0, stand_to_walk);

        // Backward steps pitch the other way
        let travel = floor_projection(target.position - start.position);
        let sign = if travel.dot(target.forward()) >= 0.0 { 1.0 } else { -1.0 };

        let waypoint = |time: Param, distance: Param, height: Param, pitch: Param| {
            let d = config.get(distance);
            let position = start.position.lerp(target.position, d) + Vec3::Y * lift * config.get(height);
            let rotation = start.rotation.slerp(target.rotation, d)
                * Quat::from_rotation_x(config.radians(pitch) * stand_to_walk * sign);
            Keyframe::new(config.get(time) * duration, Pose::new(position, rotation.normalize()))
        };

        let keys: [Keyframe<Pose>; PATH_KEYS] = [
            Keyframe::new(0.0, start),
            waypoint(Param::ToeOffTime, Param::ToeOffDistance, Param::ToeOffHeight, Param::ToeOffPitch),
            waypoint(
                Param::MidSwingTime,
                Param::MidSwingDistance,
                Param::MidSwingHeight,
                Param::MidSwingPitch,
            ),
            waypoint(
                Param::HeelStrikeTime,
                Param::HeelStrikeDistance,
                Param::HeelStrikeHeight,
                Param::HeelStrikePitch,
            ),
            Keyframe::new(duration, target),
        ];

        trace!(
            side = self.side.name(),
            from = ?start.position,
            to = ?target.position,
            stand_to_walk,
            "plotting step"
        );

        self.committed = start;
        self.step = Some(ActiveStep {
            path: FootPath::from_ordered(keys),
            clock: 0.0,
            stand_to_walk,
        });
        true
    }

    /// Drops the step in flight; the foot holds its current pose.
    pub fn cancel_course(&mut self) {
        if self.step.take().is_some() {
            self.committed = self.pose;
        }
    }

    /// Places the foot at `pose` immediately.
    pub fn snap_to(&mut self, pose: Pose) {
        if self.overridden {
            return;
        }
        self.step = None;
        self.committed = pose;
        self.pose = pose;
    }

    /// Moves the foot a frame-rate independent fraction of the way to `target`.
    pub fn follow(&mut self, target: Pose, rate: f32, delta_time: f32) {
        if self.overridden {
            return;
        }
        let alpha = 1.0 - (-rate * delta_time.max(0.0)).exp();
        self.step = None;
        self.pose = self.pose.lerp(&target, alpha);
        self.committed = self.pose;
    }

    /// Advances the step in flight by `delta_time * speed` and updates the pose.
    ///
    /// Returns true if the step landed during this tick.
    pub fn tick(&mut self, delta_time: f32, speed: f32, config: &LocomotionConfig) -> bool {
        if self.overridden {
            return false;
        }

        let Some(step) = self.step.as_mut() else {
            self.pose = self.committed;
            return false;
        };

        step.clock += delta_time.max(0.0) * speed;
        if step.clock >= step.path.duration() {
            self.committed = step.path.end();
            self.pose = self.committed;
            self.step = None;
            return true;
        }

        let mut pose = step.path.sample(step.clock);
        let strength = self.mid_swing_strength();
        pose.position.y += config.get(Param::FootLiftCorrection) * strength;
        if let Some(forward) = planar_direction(pose.forward()) {
            pose.position += forward * config.get(Param::FootForwardCorrection) * strength;
        }
        self.pose = pose;
        false
    }

    /// Returns true when the foot is planted: no step in flight, or the step
    /// is past the midpoint between heel-strike and landing.
    pub fn floor_contact(&self) -> bool {
        match &self.step {
            None => true,
            Some(step) => {
                let heel = step.path.key(StepPhase::HeelStrike).time;
                step.clock >= (step.path.duration() + heel) * 0.5
            }
        }
    }

    /// How airborne the foot is: `0` planted, peaking at mid-swing, scaled by
    /// the step's stand-to-walk ratio.
    pub fn mid_swing_strength(&self) -> f32 {
        let Some(step) = &self.step else {
            return 0.0;
        };

        let peak = step.path.key(StepPhase::MidSwing).time;
        let duration = step.path.duration();
        let ramp = if step.clock <= peak {
            step.clock / peak
        } else {
            (duration - step.clock) / (duration - peak)
        };
        ramp.clamp(0.0, 1.0) * step.stand_to_walk
    }

    /// Stand-to-walk ratio of the step in flight.
    pub fn stand_to_walk(&self) -> f32 {
        self.step.as_ref().map_or(0.0, |step| step.stand_to_walk)
    }

    /// Applies the host's override flag and the foot's actual pose.
    ///
    /// Starting an override cancels the step in flight at once. Releasing it
    /// re-commits the actual pose so the next step starts from there.
    pub fn apply_override(&mut self, overridden: bool, actual: Pose) {
        let actual = if actual.is_finite() { actual } else { self.pose };

        if overridden && !self.overridden {
            debug!(side = self.side.name(), "foot override started");
            self.step = None;
        } else if !overridden && self.overridden {
            debug!(side = self.side.name(), position = ?actual.position, "foot override released");
            self.committed = actual;
            self.pose = actual;
        }

        if overridden {
            self.pose = actual;
            self.committed = actual;
        }
        self.overridden = overridden;
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
