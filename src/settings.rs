//! Simulation settings
//!
//! Fixed at startup: loaded from a preset or a JSON file, validated once, and
//! never mutated while the simulation runs.

use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{Bounds, ContactPolicy, FrictionModel, WallMotion, Winding};

/// Named parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Heavy gravity, ball dropped from rest at the center
    #[default]
    Standard,
    /// Large slow hexagon, light gravity, slippery walls
    Gentle,
    /// Weak gravity, small ball, grippy walls, 100 Hz tick
    Lunar,
    /// Medium gravity, ball launched sideways
    Lively,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Standard, Preset::Gentle, Preset::Lunar, Preset::Lively];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::Gentle => "gentle",
            Preset::Lunar => "lunar",
            Preset::Lively => "lively",
        }
    }

    /// Full configuration for this preset
    pub fn config(&self) -> SimConfig {
        let base = SimConfig::standard();
        match self {
            Preset::Standard => base,
            Preset::Gentle => SimConfig {
                gravity: 250.0,
                restitution: 0.85,
                friction: 0.05,
                circumradius: 300.0,
                angular_velocity: 0.4,
                center: Vec2::new(400.0, 400.0),
                ball_start: Vec2::new(0.0, -100.0),
                ball_velocity: Vec2::new(50.0, -50.0),
                ..base
            },
            Preset::Lunar => SimConfig {
                gravity: 98.0,
                friction: 0.3,
                ball_radius: 10.0,
                tick: 0.01,
                ..base
            },
            Preset::Lively => SimConfig {
                gravity: 500.0,
                friction: 0.15,
                ball_radius: 15.0,
                ball_start: Vec2::new(0.0, -50.0),
                ball_velocity: Vec2::new(100.0, 0.0),
                ..base
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(Preset::Standard),
            "gentle" => Ok(Preset::Gentle),
            "lunar" => Ok(Preset::Lunar),
            "lively" => Ok(Preset::Lively),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Physics constants, initial conditions and collision policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Physics ===
    /// Gravity magnitude along +y (screen-down), pixels/s²
    pub gravity: f32,
    /// Fraction of normal speed kept after a bounce (0.0 - 1.0)
    pub restitution: f32,
    /// Tangential friction coefficient (0.0 - 1.0)
    pub friction: f32,

    // === Geometry ===
    pub circumradius: f32,
    pub ball_radius: f32,
    /// Hexagon spin (radians/sec)
    pub angular_velocity: f32,
    /// Hexagon center in world/screen coordinates
    pub center: Vec2,

    // === Initial ball state ===
    /// Start position relative to `center`
    pub ball_start: Vec2,
    pub ball_velocity: Vec2,

    // === Collision policies ===
    pub winding: Winding,
    pub contact_policy: ContactPolicy,
    pub friction_model: FrictionModel,
    pub wall_motion: WallMotion,
    /// Optional window rectangle the ball is clamped into after each step
    pub bounds: Option<Bounds>,

    // === Loop ===
    /// Fixed tick duration (seconds)
    pub tick: f32,
    /// Most ticks run for one rendered frame
    pub max_substeps: u32,
    /// Longest wall-clock frame simulated; longer frames are clamped
    pub max_frame_time: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SimConfig {
    fn standard() -> Self {
        Self {
            gravity: GRAVITY,
            restitution: RESTITUTION,
            friction: FRICTION,

            circumradius: HEX_CIRCUMRADIUS,
            ball_radius: BALL_RADIUS,
            angular_velocity: HEX_ANGULAR_VELOCITY,
            center: Vec2::new(400.0, 300.0),

            ball_start: Vec2::ZERO,
            ball_velocity: Vec2::ZERO,

            winding: Winding::default(),
            contact_policy: ContactPolicy::default(),
            friction_model: FrictionModel::default(),
            wall_motion: WallMotion::default(),
            bounds: None,

            tick: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            max_frame_time: MAX_FRAME_TIME,
        }
    }

    /// Create settings from a preset
    pub fn from_preset(preset: Preset) -> Self {
        preset.config()
    }

    /// Parse and validate a JSON config. Missing fields take `Standard` values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Distance from center to each edge midpoint
    pub fn apothem(&self) -> f32 {
        self.circumradius * (HEX_STEP / 2.0).cos()
    }

    /// Add a deterministic random kick (up to `magnitude` per axis) to the
    /// initial velocity
    pub fn with_velocity_jitter(mut self, seed: u64, magnitude: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let kick = Vec2::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        ) * magnitude;
        self.ball_velocity += kick;
        self
    }

    /// Reject anything that could reach the step loop in a bad state
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("gravity", self.gravity),
            ("restitution", self.restitution),
            ("friction", self.friction),
            ("circumradius", self.circumradius),
            ("ball_radius", self.ball_radius),
            ("angular_velocity", self.angular_velocity),
            ("tick", self.tick),
            ("max_frame_time", self.max_frame_time),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, value, "must be finite"));
            }
        }
        for (field, value) in [
            ("center", self.center),
            ("ball_start", self.ball_start),
            ("ball_velocity", self.ball_velocity),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, value, "must be finite"));
            }
        }

        if self.gravity < 0.0 {
            return Err(ConfigError::invalid("gravity", self.gravity, "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::invalid("restitution", self.restitution, "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(ConfigError::invalid("friction", self.friction, "must lie in [0, 1]"));
        }
        if self.circumradius <= 0.0 {
            return Err(ConfigError::invalid("circumradius", self.circumradius, "must be positive"));
        }
        if self.ball_radius <= 0.0 {
            return Err(ConfigError::invalid("ball_radius", self.ball_radius, "must be positive"));
        }
        if self.angular_velocity < 0.0 {
            return Err(ConfigError::invalid(
                "angular_velocity",
                self.angular_velocity,
                "must be non-negative",
            ));
        }
        if self.tick <= 0.0 {
            return Err(ConfigError::invalid("tick", self.tick, "must be positive"));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::invalid("max_substeps", self.max_substeps, "must be at least 1"));
        }
        if self.max_frame_time <= 0.0 {
            return Err(ConfigError::invalid("max_frame_time", self.max_frame_time, "must be positive"));
        }
        if self.ball_start.length() + self.ball_radius > self.apothem() {
            return Err(ConfigError::invalid(
                "ball_start",
                self.ball_start,
                "ball must start inside the hexagon's inscribed circle",
            ));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.min.is_finite() || !bounds.max.is_finite() || bounds.is_empty() {
                return Err(ConfigError::invalid("bounds", bounds, "must be a non-empty finite rectangle"));
            }
        }
        Ok(())
    }
}
