//! Hexbounce - a ball bouncing inside a rotating hexagon
//!
//! Core modules:
//! - `sim`: Deterministic simulation (hexagon geometry, collisions, impulse response)
//! - `settings`: Startup configuration, presets and validation
//! - `driver`: Fixed-timestep loop, cancellation and the renderer seam
//! - `error`: Configuration and simulation errors

pub mod driver;
pub mod error;
pub mod settings;
pub mod sim;

pub use driver::{Driver, FrameSink, JsonLinesSink, NullSink, StopToken};
pub use error::{ConfigError, RunError, SimError};
pub use settings::{Preset, SimConfig};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame the driver will simulate (seconds)
    pub const MAX_FRAME_TIME: f32 = 0.1;

    /// The arena is always a hexagon
    pub const HEX_SIDES: usize = 6;
    /// Angle between consecutive vertices (60°)
    pub const HEX_STEP: f32 = std::f32::consts::FRAC_PI_3;

    /// Arena defaults
    pub const HEX_CIRCUMRADIUS: f32 = 200.0;
    /// Hexagon spin (radians/sec)
    pub const HEX_ANGULAR_VELOCITY: f32 = 0.5;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 20.0;

    /// Gravity along +y, screen-down (pixels/s²)
    pub const GRAVITY: f32 = 980.0;
    /// Fraction of normal speed kept after a bounce
    pub const RESTITUTION: f32 = 0.8;
    /// Tangential friction coefficient
    pub const FRICTION: f32 = 0.2;

    /// Edges shorter than this are treated as degenerate
    pub const DEGENERATE_EDGE_LENGTH: f32 = 1e-6;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a vector 90° counter-clockwise (in a y-up frame)
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
