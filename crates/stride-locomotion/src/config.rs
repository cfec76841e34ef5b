//! Named, bounded locomotion parameters.
//!
//! Every tunable scalar is a [`Param`] with a static [`ParamSpec`] (name,
//! default, valid range, advanced flag). Edits go through
//! [`LocomotionConfig::set`], which clamps into range, keeps the three swing
//! timing ratios ordered and bumps [`LocomotionConfig::version`]. Dependents
//! compare versions and recompute on change instead of subscribing to events.
//!
//! ```
//! use rhizome_stride_locomotion::{LocomotionConfig, Param};
//!
//! let mut config = LocomotionConfig::default();
//! let before = config.version();
//!
//! // Out-of-range edits are clamped, not rejected
//! let stored = config.set(Param::StepHeight, 10.0).unwrap();
//! assert_eq!(stored, Param::StepHeight.spec().max);
//! assert!(config.version() > before);
//! ```

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::LocomotionError;

/// Minimum separation between the toe-off, mid-swing and heel-strike time ratios.
pub const RATIO_EPSILON: f32 = 0.02;

/// Static description of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable name used for lookup and persistence.
    pub name: &'static str,
    /// Value a fresh configuration starts with.
    pub default: f32,
    /// Lowest accepted value.
    pub min: f32,
    /// Highest accepted value.
    pub max: f32,
    /// Secondary tuning knob, hidden from simple UIs.
    pub advanced: bool,
}

macro_rules! define_params {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $name:literal, $default:expr, $min:expr, $max:expr, $advanced:expr;
    )*) => {
        /// Identifier of a locomotion parameter.
        ///
        /// Distances are meters, durations seconds, angles degrees.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Param {
            $( $(#[$meta])* $variant, )*
        }

        impl Param {
            /// Every parameter, in declaration order.
            pub const ALL: &'static [Param] = &[$(Param::$variant,)*];

            /// Number of parameters.
            pub const COUNT: usize = Self::ALL.len();

            /// Static description of this parameter.
            pub const fn spec(self) -> ParamSpec {
                match self {
                    $(Param::$variant => ParamSpec {
                        name: $name,
                        default: $default,
                        min: $min,
                        max: $max,
                        advanced: $advanced,
                    },)*
                }
            }
        }
    };
}

define_params! {
    /// Duration of one step at speed 1.
    StepDuration => "step_duration", 0.6, 0.2, 2.0, false;
    /// Peak foot lift of a full walking step.
    StepHeight => "step_height", 0.1, 0.0, 0.4, false;
    /// Longest step a foot may take ahead of the support foot.
    MaxStepDistance => "max_step_distance", 0.5, 0.1, 1.5, false;
    /// Fraction of the step height used by a standing (zero walk ratio) step.
    StandingLiftRatio => "standing_lift_ratio", 0.4, 0.0, 1.0, true;

    /// Time ratio of the toe-off key.
    ToeOffTime => "toe_off_time", 0.2, 0.0, 1.0, true;
    /// Time ratio of the mid-swing key.
    MidSwingTime => "mid_swing_time", 0.5, 0.0, 1.0, true;
    /// Time ratio of the heel-strike key.
    HeelStrikeTime => "heel_strike_time", 0.8, 0.0, 1.0, true;

    /// Travel ratio reached at toe-off.
    ToeOffDistance => "toe_off_distance", 0.1, 0.0, 1.0, true;
    /// Travel ratio reached at mid-swing.
    MidSwingDistance => "mid_swing_distance", 0.5, 0.0, 1.0, true;
    /// Travel ratio reached at heel-strike.
    HeelStrikeDistance => "heel_strike_distance", 0.9, 0.0, 1.0, true;

    /// Lift ratio at toe-off.
    ToeOffHeight => "toe_off_height", 0.6, 0.0, 1.0, true;
    /// Lift ratio at mid-swing.
    MidSwingHeight => "mid_swing_height", 1.0, 0.0, 1.0, true;
    /// Lift ratio at heel-strike.
    HeelStrikeHeight => "heel_strike_height", 0.3, 0.0, 1.0, true;

    /// Toe-down pitch at toe-off.
    ToeOffPitch => "toe_off_pitch", 20.0, -60.0, 60.0, true;
    /// Pitch at mid-swing.
    MidSwingPitch => "mid_swing_pitch", 0.0, -60.0, 60.0, true;
    /// Toe-down pitch at heel-strike (negative lifts the toe).
    HeelStrikePitch => "heel_strike_pitch", -15.0, -60.0, 60.0, true;

    /// Extra lift applied to a sampled swing pose, faded in with swing strength.
    FootLiftCorrection => "foot_lift_correction", 0.0, -0.1, 0.1, true;
    /// Extra forward shift applied to a sampled swing pose.
    FootForwardCorrection => "foot_forward_correction", 0.0, -0.1, 0.1, true;

    /// Lateral distance of a standing foot from the body center.
    FootSideOffset => "foot_side_offset", 0.1, 0.0, 0.4, false;
    /// Forward distance of a standing foot from the body center.
    FootForwardOffset => "foot_forward_offset", 0.0, -0.3, 0.3, true;
    /// Outward yaw of a standing foot.
    FootYawAngle => "foot_yaw_angle", 6.0, -45.0, 45.0, false;
    /// Lateral distance of a foot landing a full walking step.
    WalkingSideOffset => "walking_side_offset", 0.09, 0.0, 0.4, true;
    /// Outward yaw of a foot landing a full walking step.
    WalkingYawAngle => "walking_yaw_angle", 2.0, -45.0, 45.0, true;

    /// Backward offset of the gravity center from the head.
    FootBackOffset => "foot_back_offset", 0.05, -0.3, 0.3, false;
    /// Additional backward offset when fully crouched.
    CrouchBackOffset => "crouch_back_offset", 0.15, 0.0, 0.5, true;
    /// Additional backward offset when leaning fully forward.
    LeanBackOffset => "lean_back_offset", 0.2, 0.0, 1.0, true;
    /// Head height ratio above which the body reads as fully standing.
    StandingScale => "standing_scale", 0.95, 0.5, 1.0, true;
    /// How far ahead, in step durations, the body position is predicted.
    PredictionStrength => "prediction_strength", 0.5, 0.0, 2.0, false;

    /// Hip forward offset when standing.
    HipStandingForward => "hip_standing_forward", 0.0, -0.3, 0.3, true;
    /// Hip forward offset when fully crouched.
    HipCrouchingForward => "hip_crouching_forward", 0.1, -0.3, 0.3, true;
    /// Extra hip drop when fully crouched.
    HipCrouchOffset => "hip_crouch_offset", 0.05, 0.0, 0.5, true;
    /// Hip sway toward the support foot at full swing.
    HipStepSide => "hip_step_side", 0.02, 0.0, 0.2, true;
    /// Hip rise at full swing.
    HipStepRaise => "hip_step_raise", 0.01, -0.1, 0.1, true;
    /// Hip yaw at full swing.
    HipStepYaw => "hip_step_yaw", 4.0, -30.0, 30.0, true;
    /// Hip roll at full swing.
    HipStepRoll => "hip_step_roll", 3.0, -30.0, 30.0, true;

    /// Body/feet heading divergence that starts walking.
    IdleTurnAngle => "idle_turn_angle", 55.0, 10.0, 180.0, false;
    /// Distance under which a foot counts as at its target.
    StabilityEpsilon => "stability_epsilon", 0.02, 0.001, 0.1, true;
    /// Lower bound of the idle stability radius.
    MinStabilityRadius => "min_stability_radius", 0.05, 0.0, 0.5, true;
    /// Forward alignment above which the farther foot starts a walk.
    ForwardStepThreshold => "forward_step_threshold", 0.7, 0.0, 1.0, true;
    /// Highest stepping speed multiplier.
    MaxStepSpeed => "max_step_speed", 2.0, 1.0, 4.0, true;
    /// Stepping speed change per second.
    StepAcceleration => "step_acceleration", 3.0, 0.1, 20.0, true;
    /// Feet-center gap, in max step distances, that starts a jump.
    JumpFactor => "jump_factor", 1.6, 1.0, 5.0, true;
    /// Head rise above standing height that counts as a jump.
    JumpHeight => "jump_height", 0.12, 0.01, 1.0, false;
    /// Rate at which feet chase their targets while jumping.
    JumpFollowRate => "jump_follow_rate", 12.0, 1.0, 60.0, true;
    /// Feet-center gap, in max step distances, that forces a teleport.
    TeleportFactor => "teleport_factor", 2.0, 1.0, 5.0, true;
}

impl Param {
    /// Looks a parameter up by its name.
    pub fn from_name(name: &str) -> Option<Param> {
        Self::ALL.iter().copied().find(|p| p.spec().name == name)
    }

    /// Stable name of this parameter.
    pub const fn name(self) -> &'static str {
        self.spec().name
    }

    fn is_timing(self) -> bool {
        matches!(
            self,
            Param::ToeOffTime | Param::MidSwingTime | Param::HeelStrikeTime
        )
    }
}

/// Current values of every [`Param`] plus the master enable switch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(
        try_from = "BTreeMap<String, f32>",
        into = "BTreeMap<String, f32>"
    )
)]
pub struct LocomotionConfig {
    values: [f32; Param::COUNT],
    enabled: bool,
    version: u64,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        let mut values = [0.0; Param::COUNT];
        for &param in Param::ALL {
            values[param as usize] = param.spec().default;
        }
        Self {
            values,
            enabled: true,
            version: 0,
        }
    }
}

impl LocomotionConfig {
    /// Creates a configuration with every parameter at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a parameter.
    #[inline]
    pub fn get(&self, param: Param) -> f32 {
        self.values[param as usize]
    }

    /// Current value of an angle parameter, in radians.
    #[inline]
    pub fn radians(&self, param: Param) -> f32 {
        self.get(param).to_radians()
    }

    /// Sets a parameter and returns the value actually stored.
    ///
    /// The value is clamped into the parameter's range. Editing one of the
    /// swing timing ratios pushes its neighbours so that
    /// `toe_off < mid_swing < heel_strike` keeps a [`RATIO_EPSILON`] gap.
    pub fn set(&mut self, param: Param, value: f32) -> Result<f32, LocomotionError> {
        if !value.is_finite() {
            return Err(LocomotionError::NonFiniteValue { name: param.name() });
        }
        let spec = param.spec();
        let value = value.clamp(spec.min, spec.max);

        if param.is_timing() {
            self.set_timing(param, value);
        } else {
            self.store(param, value);
        }
        Ok(self.get(param))
    }

    /// Sets a parameter by name.
    pub fn set_by_name(&mut self, name: &str, value: f32) -> Result<f32, LocomotionError> {
        let param =
            Param::from_name(name).ok_or_else(|| LocomotionError::UnknownParameter(name.into()))?;
        self.set(param, value)
    }

    /// Looks a value up by parameter name.
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        Param::from_name(name).map(|p| self.get(p))
    }

    /// Restores a parameter to its default.
    pub fn reset(&mut self, param: Param) {
        let value = param.spec().default;
        if param.is_timing() {
            self.set_timing(param, value);
        } else {
            self.store(param, value);
        }
    }

    /// Iterates over every parameter and its current value.
    pub fn iter(&self) -> impl Iterator<Item = (Param, f32)> + '_ {
        Param::ALL.iter().map(move |&p| (p, self.get(p)))
    }

    /// Whether locomotion is switched on.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switches locomotion on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.version += 1;
        }
    }

    /// Counter bumped by every effective change.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn store(&mut self, param: Param, value: f32) {
        let slot = &mut self.values[param as usize];
        if *slot != value {
            *slot = value;
            self.version += 1;
        }
    }

    fn set_timing(&mut self, param: Param, value: f32) {
        let e = RATIO_EPSILON;
        let mut toe = self.get(Param::ToeOffTime);
        let mut mid = self.get(Param::MidSwingTime);
        let mut heel = self.get(Param::HeelStrikeTime);

        match param {
            Param::ToeOffTime => {
                toe = value.clamp(e, 1.0 - 3.0 * e);
                mid = mid.max(toe + e);
                heel = heel.max(mid + e);
            }
            Param::MidSwingTime => {
                mid = value.clamp(2.0 * e, 1.0 - 2.0 * e);
                toe = toe.min(mid - e);
                heel = heel.max(mid + e);
            }
            _ => {
                heel = value.clamp(3.0 * e, 1.0 - e);
                mid = mid.min(heel - e);
                toe = toe.min(mid - e);
            }
        }

        self.store(Param::ToeOffTime, toe.clamp(e, 1.0 - 3.0 * e));
        self.store(Param::MidSwingTime, mid.clamp(2.0 * e, 1.0 - 2.0 * e));
        self.store(Param::HeelStrikeTime, heel.clamp(3.0 * e, 1.0 - e));
    }
}

impl From<LocomotionConfig> for BTreeMap<String, f32> {
    fn from(config: LocomotionConfig) -> Self {
        config
            .iter()
            .map(|(p, v)| (p.name().to_string(), v))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, f32>> for LocomotionConfig {
    type Error = LocomotionError;

    /// Applies every entry through the clamping setters, starting from defaults.
    fn try_from(values: BTreeMap<String, f32>) -> Result<Self, Self::Error> {
        let mut config = LocomotionConfig::default();
        for (name, value) in values {
            config.set_by_name(&name, value)?;
        }
        config.version = 0;
        Ok(config)
    }
}
