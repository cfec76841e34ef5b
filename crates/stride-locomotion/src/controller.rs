//! Host-facing driver tying tracking, balance and output together.

use glam::Vec3;
use rhizome_stride_rig::{BodyMeasurements, Pose};
use tracing::debug;

use crate::config::LocomotionConfig;
use crate::foot_config::Side;
use crate::gait::GaitController;
use crate::heading::HeadingTracker;
use crate::input::{RigTargets, TrackingInput};
use crate::state::{LocomotionState, StateContext, StateMachine};

/// Procedural locomotion for one tracked body.
///
/// Call [`visual_update`](Self::visual_update) with fresh tracking data and
/// then [`physics_update`](Self::physics_update) once per fixed step, or
/// [`update`](Self::update) to do both.
///
/// ```
/// use glam::Vec3;
/// use rhizome_stride_locomotion::{LocomotionController, LocomotionState, TrackingInput};
/// use rhizome_stride_rig::Pose;
///
/// let mut controller = LocomotionController::default();
/// let head = Pose::from_position(Vec3::new(0.0, 1.7, 0.0));
///
/// let targets = controller.update(&TrackingInput::from_head(head), 1.0 / 60.0).unwrap();
/// assert_eq!(controller.state(), LocomotionState::Idle);
/// assert_eq!(targets.left_foot.position.y, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
    body: BodyMeasurements,
    heading: HeadingTracker,
    gait: GaitController,
    machine: StateMachine,
    input: Option<TrackingInput>,
    hip: Pose,
    seen_version: u64,
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self::new(LocomotionConfig::default(), BodyMeasurements::default())
    }
}

impl LocomotionController {
    /// Creates a controller. Feet are placed under the body on the first input.
    pub fn new(config: LocomotionConfig, body: BodyMeasurements) -> Self {
        let initial = if config.enabled() {
            LocomotionState::Idle
        } else {
            LocomotionState::Disabled
        };
        Self {
            gait: GaitController::new(&config),
            seen_version: config.version(),
            config,
            body,
            heading: HeadingTracker::default(),
            machine: StateMachine::new(initial),
            input: None,
            hip: Pose::IDENTITY,
        }
    }

    /// Ingests tracking data: head heading and velocity, foot overrides.
    ///
    /// A foot override starting here cancels that foot's step immediately.
    pub fn visual_update(&mut self, input: &TrackingInput, delta_time: f32) {
        if self.input.is_none() {
            self.heading.reset(input.head);
            self.place_feet_under_body();
        } else {
            self.heading.update(input.head, delta_time);
        }

        for side in Side::BOTH {
            let foot = input.foot(side);
            self.gait.foot_mut(side).apply_override(foot.overridden, foot.pose);
        }
        self.input = Some(*input);
    }

    /// Runs one fixed step: state logic, both feet, then the hip.
    ///
    /// Returns `None` while disabled or before any tracking data arrived.
    pub fn physics_update(&mut self, delta_time: f32) -> Option<RigTargets> {
        self.input?;

        if self.config.version() != self.seen_version {
            debug!(version = self.config.version(), "locomotion config changed");
            self.gait.refresh(&self.config);
            self.seen_version = self.config.version();
        }

        let mut ctx = StateContext {
            config: &self.config,
            body: &self.body,
            heading: &mut self.heading,
            gait: &mut self.gait,
            input: self.input.as_ref(),
            delta_time,
        };
        self.machine.sync_enabled(self.config.enabled(), &mut ctx);
        if self.machine.state() == LocomotionState::Disabled {
            return None;
        }
        self.machine.run(&mut ctx);

        self.gait.tick(delta_time, &self.config);
        let tracked_height = self.input.as_ref().and_then(TrackingInput::hip_height);
        self.hip = self
            .gait
            .hip_pose(&self.heading, tracked_height, &self.config, &self.body);

        Some(RigTargets {
            hip: self.hip,
            left_foot: self.gait.left().pose(),
            right_foot: self.gait.right().pose(),
        })
    }

    /// [`visual_update`](Self::visual_update) then [`physics_update`](Self::physics_update).
    pub fn update(&mut self, input: &TrackingInput, delta_time: f32) -> Option<RigTargets> {
        self.visual_update(input, delta_time);
        self.physics_update(delta_time)
    }

    /// Snaps both feet under the body now, then resumes walking.
    pub fn teleport(&mut self) {
        if self.input.is_none() || self.machine.state() == LocomotionState::Disabled {
            return;
        }
        let mut ctx = StateContext {
            config: &self.config,
            body: &self.body,
            heading: &mut self.heading,
            gait: &mut self.gait,
            input: self.input.as_ref(),
            delta_time: 0.0,
        };
        self.machine.transition(LocomotionState::Teleport, &mut ctx);
    }

    /// Active state.
    pub fn state(&self) -> LocomotionState {
        self.machine.state()
    }

    /// Name of the active state.
    pub fn state_name(&self) -> &'static str {
        self.machine.state().name()
    }

    /// Parameters in use.
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Parameters for editing; changes take effect on the next physics step.
    pub fn config_mut(&mut self) -> &mut LocomotionConfig {
        &mut self.config
    }

    /// Switches locomotion on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.set_enabled(enabled);
    }

    /// Body measurements in use.
    pub fn measurements(&self) -> &BodyMeasurements {
        &self.body
    }

    /// Replaces the body measurements after the rig changed.
    pub fn set_measurements(&mut self, body: BodyMeasurements) {
        self.body = body;
    }

    /// Heading estimates.
    pub fn heading(&self) -> &HeadingTracker {
        &self.heading
    }

    /// Both feet and their step paths.
    pub fn gait(&self) -> &GaitController {
        &self.gait
    }

    /// Hip pose from the last physics step.
    pub fn hip(&self) -> Pose {
        self.hip
    }

    /// Current body center on the floor.
    pub fn body_center(&self) -> Vec3 {
        self.heading.gravity_center(&self.config, &self.body)
    }

    fn place_feet_under_body(&mut self) {
        let center = self.body_center();
        let rotation = self.heading.planar_rotation();
        for side in Side::BOTH {
            let target = self.gait.ideal_target(side, center, rotation);
            self.gait.foot_mut(side).snap_to(target);
        }
    }
}
