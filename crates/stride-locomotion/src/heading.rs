//! Body heading, velocity and balance estimates from the tracked head.

use glam::{Quat, Vec3};
use rhizome_stride_rig::{BodyMeasurements, Pose, planar_direction, yaw_rotation};
use tracing::{debug, trace};

use crate::config::{LocomotionConfig, Param};

/// Default number of velocity samples kept.
pub const DEFAULT_VELOCITY_SAMPLES: usize = 45;

/// Head speed in m/s above which a move counts as a tracking discontinuity.
pub const MAX_HEAD_SPEED: f32 = 10.0;

/// Fixed-capacity ring of `(displacement, delta_time)` samples.
///
/// Storage is allocated once; pushing past capacity overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct VelocityBuffer {
    samples: Vec<(Vec3, f32)>,
    capacity: usize,
    next: usize,
}

impl VelocityBuffer {
    /// Creates an empty buffer. Capacity is at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Records a sample, overwriting the oldest once full.
    pub fn push(&mut self, displacement: Vec3, delta_time: f32) {
        if self.samples.len() < self.capacity {
            self.samples.push((displacement, delta_time));
        } else {
            self.samples[self.next] = (displacement, delta_time);
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Number of samples stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.next = 0;
    }

    /// Total displacement over total time, or zero if no time has elapsed.
    pub fn velocity(&self) -> Vec3 {
        let (displacement, time) = self
            .samples
            .iter()
            .fold((Vec3::ZERO, 0.0), |(d, t), &(sd, st)| (d + sd, t + st));
        if time > 0.0 { displacement / time } else { Vec3::ZERO }
    }
}

/// Tracks where the body is, where it faces and where it is heading.
///
/// Fed once per tick with the head pose. All derived quantities are planar
/// (on the floor) except [`HeadingTracker::head`].
#[derive(Debug, Clone)]
pub struct HeadingTracker {
    head: Pose,
    last_position: Option<Vec3>,
    forward: Vec3,
    buffer: VelocityBuffer,
}

impl Default for HeadingTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY_SAMPLES)
    }
}

impl HeadingTracker {
    /// Creates a tracker averaging velocity over `samples` ticks.
    pub fn new(samples: usize) -> Self {
        Self {
            head: Pose::IDENTITY,
            last_position: None,
            forward: Vec3::Z,
            buffer: VelocityBuffer::new(samples),
        }
    }

    /// Ingests the head pose for this tick.
    ///
    /// Non-finite poses are ignored. A move faster than [`MAX_HEAD_SPEED`]
    /// is a discontinuity (the host relocated the body) and clears the
    /// velocity history instead of being sampled.
    pub fn update(&mut self, head: Pose, delta_time: f32) {
        if !head.is_finite() {
            trace!("ignoring non-finite head pose");
            return;
        }

        if let Some(last) = self.last_position.filter(|_| delta_time > 0.0) {
            let displacement = head.position - last;
            if displacement.length() > MAX_HEAD_SPEED * delta_time {
                debug!(distance = displacement.length(), "head discontinuity, velocity history cleared");
                self.buffer.clear();
            } else {
                self.buffer.push(displacement, delta_time);
            }
        }
        self.last_position = Some(head.position);
        self.head = head;
        self.forward = self.derive_forward();
    }

    /// Forgets velocity history and restarts from `head`.
    pub fn reset(&mut self, head: Pose) {
        self.buffer.clear();
        self.last_position = None;
        self.update(head, 0.0);
    }

    /// Latest head pose.
    pub fn head(&self) -> Pose {
        self.head
    }

    /// Velocity samples.
    pub fn buffer(&self) -> &VelocityBuffer {
        &self.buffer
    }

    /// Average planar velocity over the buffered window.
    pub fn planar_velocity(&self) -> Vec3 {
        let v = self.buffer.velocity();
        Vec3::new(v.x, 0.0, v.z)
    }

    /// Unit planar forward of the body.
    pub fn body_forward(&self) -> Vec3 {
        self.forward
    }

    /// Yaw-only rotation facing [`Self::body_forward`].
    pub fn planar_rotation(&self) -> Quat {
        yaw_rotation(self.forward)
    }

    /// Head height over standing head height: `0` crouched, `1` standing.
    ///
    /// Heights above `standing_scale` of the standing height read as exactly 1.
    pub fn standing_ratio(&self, config: &LocomotionConfig, body: &BodyMeasurements) -> f32 {
        let standing = body.floor_to_head() * config.get(Param::StandingScale);
        if standing <= 0.0 {
            return 1.0;
        }
        (self.head.position.y / standing).clamp(0.0, 1.0)
    }

    /// Floor point the feet should surround for the current posture.
    ///
    /// The head's floor projection, pulled backward by the foot-back offset,
    /// more when crouched and more when leaning forward.
    pub fn gravity_center(&self, config: &LocomotionConfig, body: &BodyMeasurements) -> Vec3 {
        let crouch = 1.0 - self.standing_ratio(config, body);
        let lean = (-self.head.forward().y).max(0.0);
        let back = config.get(Param::FootBackOffset)
            + crouch * config.get(Param::CrouchBackOffset)
            + lean * config.get(Param::LeanBackOffset);

        self.head.floor_position() - self.forward * back
    }

    /// Gravity center extrapolated along the current velocity.
    pub fn projected_position(&self, config: &LocomotionConfig, body: &BodyMeasurements) -> Vec3 {
        let horizon = config.get(Param::StepDuration) * config.get(Param::PredictionStrength);
        self.gravity_center(config, body) + self.planar_velocity() * horizon
    }

    fn derive_forward(&self) -> Vec3 {
        let forward = self.head.forward();
        if let Some(dir) = planar_direction(forward) {
            return dir;
        }

        // Looking straight down or up: the top of the head points along the body
        let up = self.head.up();
        let candidate = if forward.y < 0.0 { up } else { -up };
        match planar_direction(candidate) {
            Some(dir) => {
                trace!(?dir, "heading from head up vector");
                dir
            }
            None => {
                trace!("degenerate heading, keeping previous forward");
                self.forward
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn standing_head(x: f32, z: f32) -> Pose {
        Pose::from_position(Vec3::new(x, 1.7, z))
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() {
        let mut buffer = VelocityBuffer::new(3);
        buffer.push(Vec3::X * 100.0, 1.0);
        buffer.push(Vec3::X, 1.0);
        buffer.push(Vec3::X, 1.0);
        buffer.push(Vec3::X, 1.0);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity(), 3);
        assert!((buffer.velocity() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_velocity_zero_without_time() {
        let mut tracker = HeadingTracker::default();
        assert_eq!(tracker.planar_velocity(), Vec3::ZERO);
        tracker.update(standing_head(0.0, 0.0), 0.0);
        tracker.update(standing_head(0.0, 1.0), 0.0);
        assert_eq!(tracker.planar_velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_planar_velocity() {
        let mut tracker = HeadingTracker::new(10);
        for i in 0..5 {
            let mut head = standing_head(0.0, i as f32 * 0.1);
            head.position.y += i as f32 * 0.05;
            tracker.update(head, 0.1);
        }
        let v = tracker.planar_velocity();
        assert!((v.z - 1.0).abs() < 1e-4);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_standing_ratio() {
        let config = LocomotionConfig::default();
        let body = BodyMeasurements::default();
        let mut tracker = HeadingTracker::default();

        tracker.update(standing_head(0.0, 0.0), 0.0);
        assert_eq!(tracker.standing_ratio(&config, &body), 1.0);

        let standing = body.floor_to_head() * 0.95;
        tracker.update(Pose::from_position(Vec3::Y * standing * 0.5), 0.1);
        assert!((tracker.standing_ratio(&config, &body) - 0.5).abs() < 1e-5);

        tracker.update(Pose::from_position(Vec3::ZERO), 0.1);
        assert_eq!(tracker.standing_ratio(&config, &body), 0.0);
    }

    #[test]
    fn test_gravity_center_behind_head() {
        let config = LocomotionConfig::default();
        let body = BodyMeasurements::default();
        let mut tracker = HeadingTracker::default();
        tracker.update(standing_head(0.0, 1.0), 0.0);

        let center = tracker.gravity_center(&config, &body);
        assert_eq!(center.y, 0.0);
        assert!((center.z - 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_projected_position_leads() {
        let config = LocomotionConfig::default();
        let body = BodyMeasurements::default();
        let mut tracker = HeadingTracker::default();
        tracker.update(standing_head(0.0, 0.0), 0.0);
        tracker.update(standing_head(0.0, 0.1), 0.1);

        let ahead = tracker.projected_position(&config, &body) - tracker.gravity_center(&config, &body);
        // 1 m/s over 0.6 s * 0.5
        assert!((ahead.z - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_discontinuity_clears_velocity() {
        let config = LocomotionConfig::default();
        let body = BodyMeasurements::default();
        let mut tracker = HeadingTracker::default();
        tracker.update(standing_head(0.0, 0.0), 0.0);
        tracker.update(standing_head(0.0, 0.01), 1.0 / 60.0);
        assert!(tracker.planar_velocity().z > 0.5);

        // One-frame jump of a metre: relocation, not motion
        tracker.update(standing_head(0.0, 1.01), 1.0 / 60.0);
        assert!(tracker.buffer().is_empty());
        assert_eq!(tracker.planar_velocity(), Vec3::ZERO);
        assert_eq!(
            tracker.projected_position(&config, &body),
            tracker.gravity_center(&config, &body)
        );

        tracker.update(standing_head(0.0, 1.02), 1.0 / 60.0);
        assert!((tracker.planar_velocity().z - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_heading_looking_down() {
        let mut tracker = HeadingTracker::default();
        let yaw = Quat::from_rotation_y(FRAC_PI_2);
        let down = yaw * Quat::from_rotation_x(FRAC_PI_2);
        tracker.update(Pose::new(Vec3::Y * 1.7, down), 0.0);

        let forward = tracker.body_forward();
        assert!(forward.is_finite());
        assert!((forward - Vec3::X).length() < 1e-4);
        assert!(tracker.planar_rotation().is_finite());
    }

    #[test]
    fn test_non_finite_head_ignored() {
        let mut tracker = HeadingTracker::default();
        tracker.update(standing_head(0.0, 0.0), 0.0);
        tracker.update(Pose::from_position(Vec3::NAN), 0.1);
        assert_eq!(tracker.head(), standing_head(0.0, 0.0));
        assert_eq!(tracker.body_forward(), Vec3::Z);
    }
}
