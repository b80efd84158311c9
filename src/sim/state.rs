//! Simulation state
//!
//! `Simulation` owns the ball, the hexagon and the engine. The driver holds
//! the `Simulation`; nothing in the core is process-wide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hexagon::Hexagon;
use super::tick::{PhysicsEngine, StepReport};
use crate::consts::HEX_SIDES;
use crate::error::{ConfigError, SimError};
use crate::settings::SimConfig;

/// The bouncing ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Fixed at creation
    radius: f32,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Kinetic energy per unit mass
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.vel.length_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

/// Read-only snapshot handed to the renderer after each step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    /// Simulated seconds since start
    pub time: f32,
    /// Hexagon outline, drawn as a closed line loop
    pub vertices: [Vec2; HEX_SIDES],
    pub ball_center: Vec2,
    pub ball_radius: f32,
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    engine: PhysicsEngine,
    ball: Ball,
    hexagon: Hexagon,
    /// Simulation tick counter
    time_ticks: u64,
    /// Accumulated simulated seconds
    time: f32,
}

impl Simulation {
    /// Validate `config` and set up the initial ball and hexagon
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let hexagon = Hexagon::new(config.center, config.circumradius, config.angular_velocity)
            .with_winding(config.winding);
        let ball = Ball::new(
            config.center + config.ball_start,
            config.ball_velocity,
            config.ball_radius,
        );
        let engine = PhysicsEngine::from_config(&config);

        log::info!(
            "Simulation: R={} r={} g={} e={} mu={} omega={} dt={:.4} ({}, {:?}, {:?}, {:?})",
            config.circumradius,
            config.ball_radius,
            config.gravity,
            config.restitution,
            config.friction,
            config.angular_velocity,
            config.tick,
            config.contact_policy.as_str(),
            config.friction_model,
            config.wall_motion,
            config.winding,
        );

        Ok(Self {
            config,
            engine,
            ball,
            hexagon,
            time_ticks: 0,
            time: 0.0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn hexagon(&self) -> &Hexagon {
        &self.hexagon
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the hexagon, then step the ball against it.
    ///
    /// In debug builds a non-finite ball after the step is reported as
    /// [`SimError::InvariantViolation`].
    pub fn step(&mut self, dt: f32) -> Result<StepReport, SimError> {
        self.hexagon.advance(dt);
        let report = self.engine.step(&mut self.ball, &self.hexagon, dt);

        self.time_ticks += 1;
        if dt > 0.0 {
            self.time += dt;
        }
        if report.impacts > 0 {
            log::debug!(
                "Tick {}: {} impact(s), pos {:?} vel {:?}",
                self.time_ticks,
                report.impacts,
                self.ball.pos,
                self.ball.vel
            );
        }

        if cfg!(debug_assertions) {
            self.check_invariants()?;
        }
        Ok(report)
    }

    /// Ball position and velocity must stay finite
    pub fn check_invariants(&self) -> Result<(), SimError> {
        if self.ball.is_finite() {
            Ok(())
        } else {
            Err(SimError::InvariantViolation {
                tick: self.time_ticks,
                detail: format!("ball pos {:?} vel {:?}", self.ball.pos, self.ball.vel),
            })
        }
    }

    /// Snapshot of everything the renderer is allowed to see
    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.time_ticks,
            time: self.time,
            vertices: self.hexagon.vertices(),
            ball_center: self.ball.pos,
            ball_radius: self.ball.radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Preset;

    #[test]
    fn test_new_places_ball_relative_to_center() {
        let config = Preset::Gentle.config();
        let sim = Simulation::new(config.clone()).unwrap();
        assert_eq!(sim.ball().pos, config.center + config.ball_start);
        assert_eq!(sim.ball().vel, config.ball_velocity);
        assert_eq!(sim.ball().radius(), config.ball_radius);
        assert_eq!(sim.hexagon().center(), config.center);
        assert_eq!(sim.time_ticks(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimConfig {
            restitution: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::Invalid { field: "restitution", .. })
        ));
    }

    #[test]
    fn test_step_advances_clock_and_hexagon() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(config.clone()).unwrap();
        for _ in 0..3 {
            sim.step(config.tick).unwrap();
        }
        assert_eq!(sim.time_ticks(), 3);
        assert!((sim.time() - 3.0 * config.tick).abs() < 1e-6);
        let expected = config.angular_velocity * 3.0 * config.tick;
        assert!((sim.hexagon().angle() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_frame_matches_state() {
        let config = Preset::Lively.config();
        let mut sim = Simulation::new(config.clone()).unwrap();
        sim.step(config.tick).unwrap();
        let frame = sim.frame();
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.ball_center, sim.ball().pos);
        assert_eq!(frame.ball_radius, config.ball_radius);
        assert_eq!(frame.vertices, sim.hexagon().vertices());
    }

    #[test]
    fn test_frame_serializes_as_json() {
        let sim = Simulation::new(SimConfig::default()).unwrap();
        let json = serde_json::to_string(&sim.frame()).unwrap();
        assert!(json.contains("\"vertices\""));
        assert!(json.contains("\"ball_center\":[400.0,300.0]"));
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sim.frame());
    }

    #[test]
    fn test_kinetic_energy() {
        let ball = Ball::new(Vec2::ZERO, Vec2::new(3.0, 4.0), 1.0);
        assert_eq!(ball.kinetic_energy(), 12.5);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_non_finite_ball_is_reported() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(config.clone()).unwrap();
        sim.ball.vel = Vec2::new(f32::NAN, 0.0);
        match sim.step(config.tick) {
            Err(SimError::InvariantViolation { tick, .. }) => assert_eq!(tick, 1),
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }
}
