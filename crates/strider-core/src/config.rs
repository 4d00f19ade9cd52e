use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_dt() -> f32 {
    1.0 / 60.0
}
const fn default_step_trigger_distance() -> f32 {
    0.5
}
const fn default_move_duration() -> f32 {
    0.3
}
const fn default_curve_height() -> f32 {
    1.0
}
const fn default_rest_timer() -> f32 {
    3.0
}
const fn default_true() -> bool {
    true
}
const fn default_reach_fraction() -> f32 {
    0.9999
}
const fn default_look_epsilon() -> f32 {
    0.01
}
const fn default_clearance() -> f32 {
    0.35
}
const fn default_smoothing_rate() -> f32 {
    5.0
}
const fn default_surface_body_height() -> f32 {
    1.0
}
const fn default_surface_probe_distance() -> f32 {
    1.0
}
const fn default_turn_speed_deg() -> f32 {
    100.0
}
const fn default_move_speed() -> f32 {
    1.0
}
const fn default_min_distance() -> f32 {
    1.5
}
const fn default_max_distance() -> f32 {
    3.0
}
const fn default_angle_deadband_deg() -> f32 {
    10.0
}
const fn default_probe_max_distance() -> f32 {
    10.0
}
const fn default_hip_half_width() -> f32 {
    0.25
}
const fn default_hip_half_length() -> f32 {
    0.3
}
const fn default_segment_lengths() -> [f32; 3] {
    [0.35, 0.45, 0.1]
}
const fn default_foot_reach() -> f32 {
    0.55
}
const fn default_probe_height() -> f32 {
    0.4
}
const fn default_pole_height() -> f32 {
    0.6
}

fn ensure_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn ensure_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Fixed tick used by headless runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Seconds per simulation tick (default: 1/60).
    #[serde(default = "default_dt")]
    pub dt: f32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { dt: default_dt() }
    }
}

// ---------------------------------------------------------------------------
// StepConfig
// ---------------------------------------------------------------------------

/// Per-leg stepping behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// A step is wanted once the foot drifts farther than this from home (m).
    #[serde(default = "default_step_trigger_distance")]
    pub step_trigger_distance: f32,

    /// Duration of one step in seconds.
    #[serde(default = "default_move_duration")]
    pub move_duration: f32,

    /// Fraction of `step_trigger_distance` to overshoot past home.
    #[serde(default)]
    pub overshoot_fraction: f32,

    /// Scales the arc height; 1.0 lifts the control point by half the step length.
    #[serde(default = "default_curve_height")]
    pub curve_height: f32,

    /// Idle seconds after a step before the foot is re-seated on its home.
    #[serde(default = "default_rest_timer")]
    pub rest_timer: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            step_trigger_distance: default_step_trigger_distance(),
            move_duration: default_move_duration(),
            overshoot_fraction: 0.0,
            curve_height: default_curve_height(),
            rest_timer: default_rest_timer(),
        }
    }
}

impl StepConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("step.step_trigger_distance", self.step_trigger_distance)?;
        ensure_positive("step.move_duration", self.move_duration)?;
        ensure_non_negative("step.overshoot_fraction", self.overshoot_fraction)?;
        ensure_non_negative("step.curve_height", self.curve_height)?;
        ensure_non_negative("step.rest_timer", self.rest_timer)
    }
}

// ---------------------------------------------------------------------------
// IkConfig
// ---------------------------------------------------------------------------

/// Analytic leg IK settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkConfig {
    /// Point the last bone straight at the target.
    #[serde(default = "default_true")]
    pub align_end_effector: bool,

    /// Fraction of total chain length the solver is allowed to reach.
    #[serde(default = "default_reach_fraction")]
    pub reach_fraction: f32,

    /// Look directions shorter than this are skipped for the tick.
    #[serde(default = "default_look_epsilon")]
    pub look_epsilon: f32,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            align_end_effector: true,
            reach_fraction: default_reach_fraction(),
            look_epsilon: default_look_epsilon(),
        }
    }
}

impl IkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reach_fraction > 0.0 && self.reach_fraction <= 1.0) {
            return Err(ConfigError::invalid(
                "ik.reach_fraction",
                format!("must be in (0, 1], got {}", self.reach_fraction),
            ));
        }
        ensure_non_negative("ik.look_epsilon", self.look_epsilon)
    }
}

// ---------------------------------------------------------------------------
// StabilizerConfig
// ---------------------------------------------------------------------------

/// Where the body takes its ground estimate from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundMode {
    /// Plane fit through the four home anchors.
    #[default]
    AnchorPlane,
    /// A single ray cast straight down from the body.
    SurfaceProbe,
}

/// Body height/orientation smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    #[serde(default)]
    pub ground_mode: GroundMode,

    /// Height of the body above the mean anchor height (m).
    #[serde(default = "default_clearance")]
    pub clearance: f32,

    /// Exponential smoothing rate for body position (1/s).
    #[serde(default = "default_smoothing_rate")]
    pub position_rate: f32,

    /// Exponential smoothing rate for body orientation (1/s).
    #[serde(default = "default_smoothing_rate")]
    pub rotation_rate: f32,

    /// Height above the probed surface in [`GroundMode::SurfaceProbe`] (m).
    #[serde(default = "default_surface_body_height")]
    pub surface_body_height: f32,

    /// Ray length for [`GroundMode::SurfaceProbe`] (m).
    #[serde(default = "default_surface_probe_distance")]
    pub surface_probe_distance: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            ground_mode: GroundMode::default(),
            clearance: default_clearance(),
            position_rate: default_smoothing_rate(),
            rotation_rate: default_smoothing_rate(),
            surface_body_height: default_surface_body_height(),
            surface_probe_distance: default_surface_probe_distance(),
        }
    }
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("stabilizer.clearance", self.clearance)?;
        ensure_non_negative("stabilizer.position_rate", self.position_rate)?;
        ensure_non_negative("stabilizer.rotation_rate", self.rotation_rate)?;
        ensure_non_negative("stabilizer.surface_body_height", self.surface_body_height)?;
        ensure_positive("stabilizer.surface_probe_distance", self.surface_probe_distance)
    }
}

// ---------------------------------------------------------------------------
// SteeringConfig
// ---------------------------------------------------------------------------

/// Pursuit steering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// Full-throttle turn rate (degrees per second).
    #[serde(default = "default_turn_speed_deg")]
    pub turn_speed_deg: f32,

    /// Full-throttle ground speed (m/s).
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// How quickly the turn rate approaches its target (1/s).
    #[serde(default = "default_smoothing_rate")]
    pub turn_acceleration: f32,

    /// How quickly the ground speed approaches its target (1/s).
    #[serde(default = "default_smoothing_rate")]
    pub move_acceleration: f32,

    /// Back away when closer than this to the target (m).
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,

    /// Approach when farther than this from the target (m).
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,

    /// Facing error tolerated before turning (degrees).
    #[serde(default = "default_angle_deadband_deg")]
    pub angle_deadband_deg: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            turn_speed_deg: default_turn_speed_deg(),
            move_speed: default_move_speed(),
            turn_acceleration: default_smoothing_rate(),
            move_acceleration: default_smoothing_rate(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            angle_deadband_deg: default_angle_deadband_deg(),
        }
    }
}

impl SteeringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("steering.turn_speed_deg", self.turn_speed_deg)?;
        ensure_non_negative("steering.move_speed", self.move_speed)?;
        ensure_non_negative("steering.turn_acceleration", self.turn_acceleration)?;
        ensure_non_negative("steering.move_acceleration", self.move_acceleration)?;
        ensure_non_negative("steering.min_distance", self.min_distance)?;
        ensure_non_negative("steering.angle_deadband_deg", self.angle_deadband_deg)?;
        if self.min_distance > self.max_distance {
            return Err(ConfigError::DistanceBandInverted {
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        Ok(())
    }

    /// Turn speed in radians per second.
    #[must_use]
    pub fn turn_speed(&self) -> f32 {
        self.turn_speed_deg.to_radians()
    }

    /// Facing deadband in radians.
    #[must_use]
    pub fn angle_deadband(&self) -> f32 {
        self.angle_deadband_deg.to_radians()
    }
}

// ---------------------------------------------------------------------------
// PlacementConfig
// ---------------------------------------------------------------------------

/// Home anchor ground probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Maximum probe ray length (m).
    #[serde(default = "default_probe_max_distance")]
    pub max_distance: f32,

    /// Added to the body's up axis before negating it into the probe direction.
    #[serde(default)]
    pub direction_offset: [f32; 3],
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_distance: default_probe_max_distance(),
            direction_offset: [0.0; 3],
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("placement.max_distance", self.max_distance)?;
        if self.direction_offset.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid(
                "placement.direction_offset",
                "components must be finite",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LayoutConfig
// ---------------------------------------------------------------------------

/// Body-space geometry of a symmetric quadruped.
///
/// Hips sit at `(±hip_half_width, 0, ±hip_half_length)`; each leg reaches
/// outward (away from the body's centre line) by `foot_reach`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_hip_half_width")]
    pub hip_half_width: f32,

    #[serde(default = "default_hip_half_length")]
    pub hip_half_length: f32,

    /// Upper leg, lower leg and foot lengths (m).
    #[serde(default = "default_segment_lengths")]
    pub segment_lengths: [f32; 3],

    /// Horizontal distance from hip to the resting foothold (m).
    #[serde(default = "default_foot_reach")]
    pub foot_reach: f32,

    /// Height of the home probe mount above the hip (m).
    #[serde(default = "default_probe_height")]
    pub probe_height: f32,

    /// Height of the knee pole above the hip (m).
    #[serde(default = "default_pole_height")]
    pub pole_height: f32,

    /// Per-bone mesh axis corrections as Euler angles in degrees (x, y, z).
    #[serde(default)]
    pub bone_angle_offsets: [[f32; 3]; 3],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hip_half_width: default_hip_half_width(),
            hip_half_length: default_hip_half_length(),
            segment_lengths: default_segment_lengths(),
            foot_reach: default_foot_reach(),
            probe_height: default_probe_height(),
            pole_height: default_pole_height(),
            bone_angle_offsets: [[0.0; 3]; 3],
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("layout.hip_half_width", self.hip_half_width)?;
        ensure_non_negative("layout.hip_half_length", self.hip_half_length)?;
        for (i, &len) in self.segment_lengths.iter().enumerate() {
            ensure_non_negative(&format!("layout.segment_lengths[{i}]"), len)?;
        }
        ensure_positive("layout.total_leg_length", self.segment_lengths.iter().sum())?;
        ensure_non_negative("layout.foot_reach", self.foot_reach)?;
        ensure_non_negative("layout.probe_height", self.probe_height)?;
        if self.bone_angle_offsets.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid(
                "layout.bone_angle_offsets",
                "angles must be finite",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LocomotionConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one locomotion rig.
///
/// Every section is optional in TOML; missing sections and fields take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocomotionConfig {
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub step: StepConfig,
    #[serde(default)]
    pub ik: IkConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl LocomotionConfig {
    /// Validate every section. Returns the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick.dt.is_finite() && self.tick.dt > 0.0) {
            return Err(ConfigError::InvalidTickDt(self.tick.dt));
        }
        self.step.validate()?;
        self.ik.validate()?;
        self.stabilizer.validate()?;
        self.steering.validate()?;
        self.placement.validate()?;
        self.layout.validate()
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
