//! Two-foot coordination: which foot steps, where it lands, where the hip goes.

use glam::{Quat, Vec3};
use rhizome_stride_rig::{
    BodyMeasurements, Pose, floor_projection, planar_direction, planar_distance,
};
use tracing::trace;

use crate::config::{LocomotionConfig, Param};
use crate::foot::FootController;
use crate::foot_config::Side;
use crate::heading::HeadingTracker;

/// Feet closer than this count as equally far from the body.
const TIE_DISTANCE: f32 = 1e-3;

/// Coordinates the left and right [`FootController`]s.
#[derive(Debug, Clone)]
pub struct GaitController {
    left: FootController,
    right: FootController,
    stepping: Side,
    last_stepped: Option<Side>,
    speed: f32,
    steps_taken: u32,
}

impl GaitController {
    /// Creates a gait with both feet at the origin and the left foot up next.
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            left: FootController::new(Side::Left, config),
            right: FootController::new(Side::Right, config),
            stepping: Side::Left,
            last_stepped: None,
            speed: 1.0,
            steps_taken: 0,
        }
    }

    /// Left foot.
    pub fn left(&self) -> &FootController {
        &self.left
    }

    /// Right foot.
    pub fn right(&self) -> &FootController {
        &self.right
    }

    /// Foot on `side`.
    pub fn foot(&self, side: Side) -> &FootController {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable foot on `side`.
    pub fn foot_mut(&mut self, side: Side) -> &mut FootController {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Foot that steps next (or is stepping).
    pub fn stepping(&self) -> Side {
        self.stepping
    }

    /// Current stepping speed multiplier.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Resets the stepping speed to 1.
    pub fn reset_speed(&mut self) {
        self.speed = 1.0;
    }

    /// Number of steps that landed. Cancelled steps are not counted.
    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    /// Re-derives both feet's placement after a configuration change.
    pub fn refresh(&mut self, config: &LocomotionConfig) {
        self.left.refresh(config);
        self.right.refresh(config);
    }

    /// Passes the step to the other foot.
    pub fn switch_foot(&mut self) {
        self.stepping = self.stepping.opposite();
    }

    /// Cancels both feet's steps.
    pub fn cancel_all(&mut self) {
        self.left.cancel_course();
        self.right.cancel_course();
    }

    /// Ideal standing pose of a foot for the given body center and heading.
    pub fn ideal_target(&self, side: Side, body_center: Vec3, heading: Quat) -> Pose {
        self.foot(side).target_pose(body_center, heading, 0.0)
    }

    /// Midpoint of both feet's ideal standing positions.
    pub fn ideal_feet_center(&self, body_center: Vec3, heading: Quat) -> Vec3 {
        let left = self.ideal_target(Side::Left, body_center, heading).position;
        let right = self.ideal_target(Side::Right, body_center, heading).position;
        (left + right) * 0.5
    }

    /// Midpoint of both feet on the floor.
    pub fn feet_center(&self) -> Vec3 {
        (self.left.pose().floor_position() + self.right.pose().floor_position()) * 0.5
    }

    /// Planar distance between the feet.
    pub fn feet_separation(&self) -> f32 {
        planar_distance(self.left.pose().position, self.right.pose().position)
    }

    /// Planar direction the feet face together.
    pub fn feet_forward(&self) -> Vec3 {
        let left = self.left.pose();
        let right = self.right.pose();
        planar_direction(left.forward() + right.forward())
            .or_else(|| planar_direction((right.position - left.position).cross(Vec3::Y)))
            .unwrap_or(Vec3::Z)
    }

    /// Returns true if both feet rest within `stability_epsilon` of their
    /// ideal standing targets.
    pub fn feet_are_stable(&self, body_center: Vec3, heading: Quat, config: &LocomotionConfig) -> bool {
        let epsilon = config.get(Param::StabilityEpsilon);
        Side::BOTH.iter().all(|&side| {
            let target = self.ideal_target(side, body_center, heading);
            self.foot(side).pose().position.distance(target.position) <= epsilon
        })
    }

    /// Picks the foot that starts a walk toward `body_center`.
    ///
    /// Mostly forward or backward motion leads with the foot farther from the
    /// body center. Sideways motion leads with the foot on the side moved
    /// toward. Ties go to the foot that did not step last.
    pub fn select_start_foot(&mut self, body_center: Vec3, heading: Quat, config: &LocomotionConfig) -> Side {
        let displacement = floor_projection(self.ideal_feet_center(body_center, heading) - self.feet_center());
        let tie_break = self.last_stepped.map_or(Side::Left, Side::opposite);

        let side = match planar_direction(displacement) {
            Some(direction) => {
                let forward = heading * Vec3::Z;
                if direction.dot(forward).abs() > config.get(Param::ForwardStepThreshold) {
                    let left = planar_distance(self.left.pose().position, body_center);
                    let right = planar_distance(self.right.pose().position, body_center);
                    if (left - right).abs() <= TIE_DISTANCE {
                        tie_break
                    } else if left > right {
                        Side::Left
                    } else {
                        Side::Right
                    }
                } else {
                    let lateral = direction.dot(heading * Vec3::X);
                    if lateral.abs() <= TIE_DISTANCE {
                        tie_break
                    } else if lateral > 0.0 {
                        Side::Right
                    } else {
                        Side::Left
                    }
                }
            }
            None => tie_break,
        };

        self.stepping = side;
        side
    }

    /// Plans a step of the stepping foot toward its target around `body_center`.
    ///
    /// The landing is kept within `limit` of the point beside the support
    /// foot's destination. Steps shorter than half the stability epsilon are
    /// skipped. Returns whether a step was planned.
    pub fn plan_step(
        &mut self,
        body_center: Vec3,
        heading: Quat,
        limit: f32,
        config: &LocomotionConfig,
    ) -> bool {
        let side = self.stepping;
        let max_step = config.get(Param::MaxStepDistance);
        let support = self.foot(side.opposite());
        let foot = self.foot(side);

        let standing = foot.target_pose(body_center, heading, 0.0);
        let travel = planar_distance(foot.pose().position, standing.position);
        let stand_to_walk = (travel / max_step).clamp(0.0, 1.0);
        let mut target = foot.target_pose(body_center, heading, stand_to_walk);

        // The body center the support foot implies, re-offset to this foot
        let support_dest = support.destination();
        let implied_center =
            support_dest.position - heading * support.placement().offset(stand_to_walk);
        let anchor = floor_projection(implied_center + heading * foot.placement().offset(stand_to_walk));
        let reach = floor_projection(target.position - anchor);
        if reach.length() > limit {
            target.position = anchor + reach.normalize_or_zero() * limit;
        }

        let travel = planar_distance(foot.pose().position, target.position);
        if travel < config.get(Param::StabilityEpsilon) * 0.5 {
            trace!(side = side.name(), travel, "step too short, skipped");
            return false;
        }

        let planned = self.foot_mut(side).plot_course(target, stand_to_walk, config);
        if planned {
            self.last_stepped = Some(side);
        }
        planned
    }

    /// Ramps the stepping speed toward what the remaining `gap` calls for.
    pub fn update_speed(&mut self, gap: f32, delta_time: f32, config: &LocomotionConfig) {
        let desired = (gap / config.get(Param::MaxStepDistance))
            .clamp(1.0, config.get(Param::MaxStepSpeed));
        let max_change = config.get(Param::StepAcceleration) * delta_time.max(0.0);
        self.speed += (desired - self.speed).clamp(-max_change, max_change);
    }

    /// Advances both feet, counting the steps that land.
    pub fn tick(&mut self, delta_time: f32, config: &LocomotionConfig) {
        let speed = self.speed;
        for side in Side::BOTH {
            if self.foot_mut(side).tick(delta_time, speed, config) {
                self.steps_taken += 1;
                trace!(side = side.name(), steps = self.steps_taken, "step landed");
            }
        }
    }

    /// Signed swing: positive while the right foot is airborne, negative for
    /// the left.
    pub fn swing(&self) -> f32 {
        self.right.mid_swing_strength() - self.left.mid_swing_strength()
    }

    /// Hip pose for the current head posture and foot swing.
    ///
    /// The resting height comes from `tracked_height` when the host tracks
    /// the hip, otherwise from the head height. Must be derived after both
    /// feet have ticked.
    pub fn hip_pose(
        &self,
        heading: &HeadingTracker,
        tracked_height: Option<f32>,
        config: &LocomotionConfig,
        body: &BodyMeasurements,
    ) -> Pose {
        let swing = self.swing();
        let standing = heading.standing_ratio(config, body);

        let resting = tracked_height.unwrap_or_else(|| {
            heading.head().position.y
                - body.hip_to_head()
                - (1.0 - standing) * config.get(Param::HipCrouchOffset)
        });
        let height = resting.clamp(0.0, body.floor_to_hip())
            + config.get(Param::HipStepRaise) * swing.abs();

        let forward = config.get(Param::HipCrouchingForward)
            + (config.get(Param::HipStandingForward) - config.get(Param::HipCrouchingForward)) * standing;

        let local = Vec3::new(-swing * config.get(Param::HipStepSide), height, forward);
        let rotation = heading.planar_rotation();
        let position = heading.gravity_center(config, body) + rotation * local;

        let rotation = rotation
            * Quat::from_rotation_y(swing * config.radians(Param::HipStepYaw))
            * Quat::from_rotation_z(-swing * config.radians(Param::HipStepRoll));

        Pose::new(position, rotation)
    }
}
