//! Balance state machine.
//!
//! One [`LocomotionState`] is active at a time. Each state has enter, exit
//! and update functions over a shared [`StateContext`]; `update` may request
//! a transition, which the [`StateMachine`] applies (exit, then enter) before
//! letting the new state update in the same tick.

use glam::{Quat, Vec3};
use rhizome_stride_rig::{BodyMeasurements, planar_distance};
use tracing::debug;

use crate::config::{LocomotionConfig, Param};
use crate::foot_config::Side;
use crate::gait::GaitController;
use crate::heading::HeadingTracker;
use crate::input::TrackingInput;

/// Upper bound on transitions applied within one tick.
const MAX_TRANSITIONS_PER_TICK: usize = 6;

/// Active locomotion behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionState {
    /// Locomotion switched off; feet are left alone.
    Disabled,
    /// Standing; watching for the body to leave the feet.
    Idle,
    /// Stepping toward the body, one foot at a time.
    Walking,
    /// Body airborne; feet chase their targets directly.
    Jumping,
    /// Feet snap under the body.
    Teleport,
}

impl LocomotionState {
    /// Diagnostic name.
    pub fn name(self) -> &'static str {
        match self {
            LocomotionState::Disabled => "disabled",
            LocomotionState::Idle => "idle",
            LocomotionState::Walking => "walking",
            LocomotionState::Jumping => "jumping",
            LocomotionState::Teleport => "teleport",
        }
    }

    fn enter(self, ctx: &mut StateContext<'_>) {
        match self {
            LocomotionState::Disabled => ctx.gait.cancel_all(),
            LocomotionState::Idle => {}
            LocomotionState::Walking => walking_enter(ctx),
            LocomotionState::Jumping => {
                ctx.gait.cancel_all();
                ctx.gait.reset_speed();
            }
            LocomotionState::Teleport => teleport_enter(ctx),
        }
    }

    fn exit(self, ctx: &mut StateContext<'_>) {
        match self {
            LocomotionState::Disabled => disabled_exit(ctx),
            LocomotionState::Walking => ctx.gait.reset_speed(),
            LocomotionState::Idle | LocomotionState::Jumping | LocomotionState::Teleport => {}
        }
    }

    fn update(self, ctx: &mut StateContext<'_>) -> Option<LocomotionState> {
        match self {
            LocomotionState::Disabled => None,
            LocomotionState::Idle => idle_update(ctx),
            LocomotionState::Walking => walking_update(ctx),
            LocomotionState::Jumping => jumping_update(ctx),
            LocomotionState::Teleport => Some(LocomotionState::Walking),
        }
    }
}

impl std::fmt::Display for LocomotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a state reads or drives during one tick.
pub(crate) struct StateContext<'a> {
    pub config: &'a LocomotionConfig,
    pub body: &'a BodyMeasurements,
    pub heading: &'a mut HeadingTracker,
    pub gait: &'a mut GaitController,
    pub input: Option<&'a TrackingInput>,
    pub delta_time: f32,
}

impl StateContext<'_> {
    fn rotation(&self) -> Quat {
        self.heading.planar_rotation()
    }

    fn gravity_center(&self) -> Vec3 {
        self.heading.gravity_center(self.config, self.body)
    }

    fn projected_position(&self) -> Vec3 {
        self.heading.projected_position(self.config, self.body)
    }

    /// Planar gap between where the feet are centered and where they should be.
    fn feet_gap(&self, body_center: Vec3) -> f32 {
        planar_distance(
            self.gait.ideal_feet_center(body_center, self.rotation()),
            self.gait.feet_center(),
        )
    }

    /// Returns true if the head rose off the floor or the body got further
    /// from the feet than a step can recover.
    fn is_jumping(&self, gap: f32) -> bool {
        let raised = self.heading.head().position.y - self.body.floor_to_head();
        raised > self.config.get(Param::JumpHeight)
            || gap > self.config.get(Param::JumpFactor) * self.config.get(Param::MaxStepDistance)
    }
}

/// Holds the active state and applies transitions.
#[derive(Debug, Clone)]
pub(crate) struct StateMachine {
    state: LocomotionState,
}

impl StateMachine {
    pub fn new(initial: LocomotionState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    /// Leaves the current state and enters `next`.
    pub fn transition(&mut self, next: LocomotionState, ctx: &mut StateContext<'_>) {
        if next == self.state {
            return;
        }
        debug!(from = self.state.name(), to = next.name(), "locomotion state transition");
        self.state.exit(ctx);
        self.state = next;
        self.state.enter(ctx);
    }

    /// Moves into or out of [`LocomotionState::Disabled`] to match `enabled`.
    pub fn sync_enabled(&mut self, enabled: bool, ctx: &mut StateContext<'_>) {
        let disabled = self.state == LocomotionState::Disabled;
        if !enabled && !disabled {
            self.transition(LocomotionState::Disabled, ctx);
        } else if enabled && disabled {
            self.transition(LocomotionState::Idle, ctx);
        }
    }

    /// Updates the active state, following requested transitions.
    pub fn run(&mut self, ctx: &mut StateContext<'_>) {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            match self.state.update(ctx) {
                Some(next) if next != self.state => self.transition(next, ctx),
                _ => return,
            }
        }
    }
}

fn idle_update(ctx: &mut StateContext<'_>) -> Option<LocomotionState> {
    let radius = (ctx.gait.feet_separation() * 0.5).max(ctx.config.get(Param::MinStabilityRadius));

    for center in [ctx.gravity_center(), ctx.projected_position()] {
        if ctx.feet_gap(center) > radius {
            return Some(LocomotionState::Walking);
        }
    }

    let turn = ctx.heading.body_forward().angle_between(ctx.gait.feet_forward());
    if turn > ctx.config.radians(Param::IdleTurnAngle) {
        return Some(LocomotionState::Walking);
    }

    None
}

fn walking_enter(ctx: &mut StateContext<'_>) {
    let center = ctx.projected_position();
    let rotation = ctx.rotation();
    let limit = ctx.config.get(Param::MaxStepDistance);

    ctx.gait.select_start_foot(center, rotation, ctx.config);
    ctx.gait.plan_step(center, rotation, limit, ctx.config);
}

fn walking_update(ctx: &mut StateContext<'_>) -> Option<LocomotionState> {
    let center = ctx.projected_position();
    let rotation = ctx.rotation();
    let max_step = ctx.config.get(Param::MaxStepDistance);

    let behind = ctx.feet_gap(ctx.gravity_center());
    if behind > ctx.config.get(Param::TeleportFactor) * max_step {
        return Some(LocomotionState::Teleport);
    }
    if ctx.is_jumping(behind) {
        return Some(LocomotionState::Jumping);
    }

    let gap = ctx.feet_gap(center);
    ctx.gait.update_speed(gap, ctx.delta_time, ctx.config);

    let stepping = ctx.gait.stepping();
    if !ctx.gait.foot(stepping).floor_contact() {
        return None;
    }
    // The support foot must land before it can take over
    if ctx.gait.foot(stepping.opposite()).is_animating() {
        return None;
    }

    if !ctx.gait.foot(stepping).is_animating() && ctx.gait.feet_are_stable(center, rotation, ctx.config) {
        return Some(LocomotionState::Idle);
    }

    ctx.gait.switch_foot();
    ctx.gait.plan_step(center, rotation, max_step, ctx.config);
    None
}

fn jumping_update(ctx: &mut StateContext<'_>) -> Option<LocomotionState> {
    let center = ctx.gravity_center();
    let rotation = ctx.rotation();

    if !ctx.is_jumping(ctx.feet_gap(center)) && ctx.gait.feet_are_stable(center, rotation, ctx.config) {
        return Some(LocomotionState::Walking);
    }

    ctx.gait.reset_speed();
    let rate = ctx.config.get(Param::JumpFollowRate);
    for side in Side::BOTH {
        let target = ctx.gait.ideal_target(side, center, rotation);
        ctx.gait.foot_mut(side).follow(target, rate, ctx.delta_time);
    }
    None
}

fn teleport_enter(ctx: &mut StateContext<'_>) {
    // Forget velocity gathered before the move
    let head = ctx.heading.head();
    ctx.heading.reset(head);

    let center = ctx.gravity_center();
    let rotation = ctx.rotation();

    ctx.gait.cancel_all();
    for side in Side::BOTH {
        let target = ctx.gait.ideal_target(side, center, rotation);
        ctx.gait.foot_mut(side).snap_to(target);
    }
}

fn disabled_exit(ctx: &mut StateContext<'_>) {
    let Some(input) = ctx.input else {
        return;
    };
    for side in Side::BOTH {
        let actual = input.foot(side).pose;
        if actual.is_finite() {
            ctx.gait.foot_mut(side).snap_to(actual.floored());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizome_stride_rig::Pose;

    struct Rig {
        config: LocomotionConfig,
        body: BodyMeasurements,
        heading: HeadingTracker,
        gait: GaitController,
    }

    impl Rig {
        /// Standing at the origin, no prediction or back offset so the gravity
        /// center is the head's floor point.
        fn standing() -> Self {
            let mut config = LocomotionConfig::default();
            config.set(Param::PredictionStrength, 0.0).unwrap();
            config.set(Param::FootBackOffset, 0.0).unwrap();
            let body = BodyMeasurements::default();
            let mut heading = HeadingTracker::default();
            heading.update(Pose::from_position(Vec3::Y * body.floor_to_head()), 0.0);

            let mut gait = GaitController::new(&config);
            for side in Side::BOTH {
                let target = gait.ideal_target(side, Vec3::ZERO, Quat::IDENTITY);
                gait.foot_mut(side).snap_to(target);
            }
            Self {
                config,
                body,
                heading,
                gait,
            }
        }

        fn ctx(&mut self) -> StateContext<'_> {
            StateContext {
                config: &self.config,
                body: &self.body,
                heading: &mut self.heading,
                gait: &mut self.gait,
                input: None,
                delta_time: 1.0 / 60.0,
            }
        }

        fn move_head(&mut self, position: Vec3) {
            self.heading.update(Pose::from_position(position), 1.0 / 60.0);
        }
    }

    #[test]
    fn test_idle_trigger_radius() {
        let mut rig = Rig::standing();
        assert!((rig.gait.feet_separation() - 0.2).abs() < 1e-5);
        let height = rig.body.floor_to_head();

        rig.move_head(Vec3::new(0.0, height, 0.05));
        assert_eq!(idle_update(&mut rig.ctx()), None);

        rig.move_head(Vec3::new(0.0, height, 0.15));
        assert_eq!(idle_update(&mut rig.ctx()), Some(LocomotionState::Walking));
    }

    #[test]
    fn test_idle_trigger_turn() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();

        let turned = |deg: f32| Pose::new(Vec3::Y * height, Quat::from_rotation_y(deg.to_radians()));
        rig.heading.update(turned(40.0), 1.0 / 60.0);
        assert_eq!(idle_update(&mut rig.ctx()), None);

        rig.heading.update(turned(70.0), 1.0 / 60.0);
        assert_eq!(idle_update(&mut rig.ctx()), Some(LocomotionState::Walking));
    }

    #[test]
    fn test_teleport_lands_feet_on_targets() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();
        rig.move_head(Vec3::new(3.0, height, 4.0));

        let mut machine = StateMachine::new(LocomotionState::Walking);
        machine.transition(LocomotionState::Teleport, &mut rig.ctx());

        let center = Vec3::new(3.0, 0.0, 4.0);
        assert!(rig.gait.feet_are_stable(center, Quat::IDENTITY, &rig.config));
        for side in Side::BOTH {
            let target = rig.gait.ideal_target(side, center, Quat::IDENTITY);
            assert!(rig.gait.foot(side).pose().position.distance(target.position) < 1e-5);
        }
    }

    #[test]
    fn test_walking_far_gap_teleports() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();
        rig.move_head(Vec3::new(0.0, height, 5.0));

        let mut machine = StateMachine::new(LocomotionState::Walking);
        machine.run(&mut rig.ctx());

        // Teleport hands over to walking, which finds nothing to do
        assert_eq!(machine.state(), LocomotionState::Idle);
        assert!((rig.gait.feet_center() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn test_jump_detected_and_recovered() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();
        let mut machine = StateMachine::new(LocomotionState::Walking);

        rig.move_head(Vec3::new(0.0, height + 0.3, 0.2));
        machine.run(&mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Jumping);

        rig.move_head(Vec3::new(0.0, height, 0.2));
        for _ in 0..120 {
            machine.run(&mut rig.ctx());
            rig.gait.tick(1.0 / 60.0, &rig.config);
            if machine.state() != LocomotionState::Jumping {
                break;
            }
        }
        assert_ne!(machine.state(), LocomotionState::Jumping);
        assert!((rig.gait.feet_center().z - 0.2).abs() < 0.03);
    }

    #[test]
    fn test_teleport_forgets_velocity() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();
        for i in 1..=10 {
            rig.move_head(Vec3::new(0.0, height, i as f32 * 0.02));
        }
        assert!(rig.heading.planar_velocity().z > 1.0);

        let mut machine = StateMachine::new(LocomotionState::Walking);
        machine.transition(LocomotionState::Teleport, &mut rig.ctx());
        assert_eq!(rig.heading.planar_velocity(), Vec3::ZERO);
        assert!((rig.gait.feet_center() - Vec3::new(0.0, 0.0, 0.2)).length() < 1e-5);
    }

    #[test]
    fn test_planar_gap_starts_jump() {
        let mut rig = Rig::standing();
        let height = rig.body.floor_to_head();
        let mut machine = StateMachine::new(LocomotionState::Walking);

        // Further than 1.6 steps, closer than the 2 step teleport gap
        rig.move_head(Vec3::new(0.0, height, 0.9));
        machine.run(&mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Jumping);

        for _ in 0..120 {
            machine.run(&mut rig.ctx());
            rig.gait.tick(1.0 / 60.0, &rig.config);
            if machine.state() != LocomotionState::Jumping {
                break;
            }
        }
        assert_ne!(machine.state(), LocomotionState::Jumping);
        assert!((rig.gait.feet_center().z - 0.9).abs() < rig.config.get(Param::StabilityEpsilon));
    }

    #[test]
    fn test_sync_enabled() {
        let mut rig = Rig::standing();
        let mut machine = StateMachine::new(LocomotionState::Idle);

        machine.sync_enabled(true, &mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Idle);

        machine.sync_enabled(false, &mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Disabled);
        machine.run(&mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Disabled);

        machine.sync_enabled(true, &mut rig.ctx());
        assert_eq!(machine.state(), LocomotionState::Idle);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(LocomotionState::Walking.name(), "walking");
        assert_eq!(LocomotionState::Teleport.to_string(), "teleport");
    }
}
