//! End-to-end walk cycles driven through the public controller.

use glam::{Quat, Vec3};
use rhizome_stride_locomotion::{
    FootInput, LocomotionController, LocomotionState, Param, RigTargets, Side, TrackingInput,
};
use rhizome_stride_rig::Pose;

const DT: f32 = 1.0 / 60.0;

fn head_at(z: f32) -> TrackingInput {
    TrackingInput::from_head(Pose::from_position(Vec3::new(0.0, 1.7, z)))
}

/// Head moved `distance` forward in one frame; returns the steps taken
/// until the controller settled back to idle.
fn walk_to(controller: &mut LocomotionController, distance: f32) -> (u32, Vec<Side>) {
    controller.update(&head_at(0.0), DT);
    assert_eq!(controller.state(), LocomotionState::Idle);

    let mut saw_walking = false;
    let mut step_sides = Vec::new();
    let mut animating = [false, false];

    for _ in 0..600 {
        let targets = controller.update(&head_at(distance), DT).unwrap();
        assert_finite(&targets);
        assert_ne!(controller.state(), LocomotionState::Jumping);

        saw_walking |= controller.state() == LocomotionState::Walking;
        for (i, side) in Side::BOTH.into_iter().enumerate() {
            let now = controller.gait().foot(side).is_animating();
            if now && !animating[i] {
                step_sides.push(side);
            }
            animating[i] = now;
        }

        if saw_walking && controller.state() == LocomotionState::Idle {
            break;
        }
    }

    assert!(saw_walking, "never walked toward {distance}");
    assert_eq!(controller.state(), LocomotionState::Idle);
    (controller.gait().steps_taken(), step_sides)
}

fn assert_finite(targets: &RigTargets) {
    assert!(targets.hip.is_finite());
    assert!(targets.left_foot.is_finite());
    assert!(targets.right_foot.is_finite());
}

#[test]
fn test_walks_to_head_then_idles() {
    let mut controller = LocomotionController::default();
    let (steps, step_sides) = walk_to(&mut controller, 0.7);

    // ceil(0.7 / 0.5) + 1
    assert!(steps >= 2 && steps <= 3, "steps taken: {steps}");
    assert_eq!(step_sides.len(), steps as usize);
    assert!(step_sides.windows(2).all(|w| w[0] != w[1]), "{step_sides:?}");

    let center = controller.gait().feet_center();
    assert!((center.z - 0.65).abs() < controller.config().get(Param::StabilityEpsilon));
}

#[test]
fn test_step_count_within_bound() {
    for distance in [0.3, 0.45, 0.7] {
        let mut controller = LocomotionController::default();
        let max_step = controller.config().get(Param::MaxStepDistance);
        let (steps, _) = walk_to(&mut controller, distance);

        let bound = (distance / max_step).ceil() as u32 + 1;
        assert!(steps <= bound, "{distance} m took {steps} steps, bound {bound}");
        assert!(steps >= 1);
    }
}

#[test]
fn test_small_lean_stays_idle() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    for i in 1..=120 {
        let z = 0.05 * (i as f32 / 60.0).min(1.0);
        controller.update(&head_at(z), DT);
        assert_eq!(controller.state(), LocomotionState::Idle);
    }
    assert_eq!(controller.gait().steps_taken(), 0);
}

#[test]
fn test_feet_stay_planted_while_idle() {
    let mut controller = LocomotionController::default();
    let first = controller.update(&head_at(0.0), DT).unwrap();

    for _ in 0..60 {
        let targets = controller.update(&head_at(0.0), DT).unwrap();
        assert_eq!(targets.left_foot, first.left_foot);
        assert_eq!(targets.right_foot, first.right_foot);
    }
}

#[test]
fn test_hip_bobs_with_swing() {
    let mut controller = LocomotionController::default();
    let standing = controller.update(&head_at(0.0), DT).unwrap();

    let mut max_sway = 0.0f32;
    for _ in 0..120 {
        let targets = controller.update(&head_at(0.6), DT).unwrap();
        max_sway = max_sway.max(targets.hip.position.x.abs());
    }
    assert!(max_sway > 0.0);
    assert!(standing.hip.position.x.abs() < 1e-6);
}

#[test]
fn test_far_jump_teleports_feet() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    // Teleport is instantaneous: the feet are under the body in the same tick
    controller.update(&head_at(5.0), DT);
    let center = controller.gait().feet_center();
    assert!((center.z - 4.95).abs() < 1e-4);
    assert_eq!(controller.state(), LocomotionState::Idle);
    // The entry step planned before the teleport never landed
    assert_eq!(controller.gait().steps_taken(), 0);
}

#[test]
fn test_sudden_move_keeps_feet_under_body() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);
    let max_step = controller.config().get(Param::MaxStepDistance);

    for _ in 0..180 {
        controller.update(&head_at(3.0), DT);
        let head_floor = Vec3::new(0.0, 0.0, 3.0);
        let center = controller.gait().feet_center();
        assert!(center.distance(head_floor) <= max_step, "feet center {center}");
        assert_eq!(controller.state(), LocomotionState::Idle);
    }
    assert_eq!(controller.gait().steps_taken(), 0);
    assert_eq!(controller.heading().planar_velocity(), Vec3::ZERO);
}

#[test]
fn test_large_gap_jumps_then_lands() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    // Past 1.6 step lengths but short of the 2 step teleport gap
    let mut states = Vec::new();
    for _ in 0..300 {
        controller.update(&head_at(0.9), DT);
        if states.last() != Some(&controller.state()) {
            states.push(controller.state());
        }
        if states.contains(&LocomotionState::Jumping) && controller.state() == LocomotionState::Idle {
            break;
        }
    }
    assert_eq!(states.first(), Some(&LocomotionState::Jumping));
    assert_eq!(controller.state(), LocomotionState::Idle);

    let center = controller.gait().feet_center();
    assert!((center.z - 0.85).abs() < controller.config().get(Param::StabilityEpsilon));
}

#[test]
fn test_jump_and_land() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    let mut airborne = head_at(0.3);
    airborne.head.position.y += 0.4;
    controller.update(&head_at(0.3), DT);
    controller.update(&airborne, DT);
    assert_eq!(controller.state(), LocomotionState::Jumping);

    for _ in 0..300 {
        controller.update(&head_at(0.3), DT);
        if controller.state() == LocomotionState::Idle {
            break;
        }
    }
    assert_eq!(controller.state(), LocomotionState::Idle);
}

#[test]
fn test_override_release_resyncs() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    let dragged = Pose::new(Vec3::new(-0.4, 0.0, 0.3), Quat::from_rotation_y(0.5));
    let mut input = head_at(0.0);
    input.left_foot = FootInput::overridden(dragged);
    let targets = controller.update(&input, DT).unwrap();
    assert_eq!(targets.left_foot, dragged);

    input.left_foot = FootInput::new(dragged);
    controller.update(&input, DT);
    assert_eq!(controller.gait().left().committed(), dragged);
    assert!(!controller.gait().left().is_animating());

    // The next left step starts where the host left the foot
    let mut first_left_start = None;
    for _ in 0..600 {
        controller.update(&head_at(0.6), DT);
        if first_left_start.is_none() {
            first_left_start = controller.gait().left().path().map(|p| p.start());
        }
        if controller.state() == LocomotionState::Idle && controller.gait().steps_taken() > 0 {
            break;
        }
    }
    assert_eq!(first_left_start, Some(dragged));
    assert_eq!(controller.state(), LocomotionState::Idle);
}

#[test]
fn test_looking_straight_down_stays_finite() {
    let mut controller = LocomotionController::default();
    controller.update(&head_at(0.0), DT);

    let down = Pose::new(Vec3::new(0.0, 1.6, 0.0), Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
    for _ in 0..120 {
        let targets = controller.update(&TrackingInput::from_head(down), DT).unwrap();
        assert_finite(&targets);
    }
    assert!((controller.heading().body_forward() - Vec3::Z).length() < 1e-4);
}
