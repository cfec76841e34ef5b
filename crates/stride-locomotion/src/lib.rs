//! Procedural bipedal locomotion.
//!
//! Given a tracked head pose every frame, keeps a character's feet under its
//! body: decides when to step, which foot steps, plans each step as a
//! five-key [`FootPath`] and derives the hip pose from the feet's swing.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use rhizome_stride_locomotion::{LocomotionController, LocomotionState, TrackingInput};
//! use rhizome_stride_rig::Pose;
//!
//! let mut controller = LocomotionController::default();
//!
//! let head = |z: f32| TrackingInput::from_head(Pose::from_position(Vec3::new(0.0, 1.7, z)));
//! controller.update(&head(0.0), 1.0 / 60.0);
//!
//! // Lean out past the feet: the controller starts walking
//! controller.update(&head(0.4), 1.0 / 60.0);
//! assert_eq!(controller.state(), LocomotionState::Walking);
//! ```

mod config;
mod controller;
mod error;
mod foot;
mod foot_config;
mod foot_path;
mod gait;
mod heading;
mod input;
mod state;

pub use config::{LocomotionConfig, Param, ParamSpec, RATIO_EPSILON};
pub use controller::LocomotionController;
pub use error::LocomotionError;
pub use foot::FootController;
pub use foot_config::{FootConfiguration, Side};
pub use foot_path::{FootPath, PATH_KEYS, StepPhase};
pub use gait::GaitController;
pub use heading::{DEFAULT_VELOCITY_SAMPLES, HeadingTracker, MAX_HEAD_SPEED, VelocityBuffer};
pub use input::{FootInput, RigTargets, TrackingInput};
pub use state::LocomotionState;
