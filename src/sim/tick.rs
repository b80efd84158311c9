//! Fixed timestep physics step
//!
//! One step is two phases:
//! 1. Integrate: gravity into velocity, velocity into position (semi-implicit Euler)
//! 2. Resolve: every edge, in index order, is tested and corrected
//!
//! Edges are resolved one after another against the already-corrected ball, so
//! a ball wedged into a corner gets pushed out of both walls in the same step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{
    Bounds, Contact, ContactPolicy, ball_edge_contact, clamp_to_bounds, wall_velocity,
};
use super::hexagon::{Edge, Hexagon};
use super::state::Ball;
use crate::settings::SimConfig;

/// Tangential response on impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionModel {
    /// Tangential impulse that would stop sliding, capped at `friction * |j_n|`
    #[default]
    Coulomb,
    /// Tangential speed scaled by `1 - friction`
    Damping,
}

/// Whether the walls' own motion takes part in the impulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallMotion {
    /// Resolve against velocity relative to the spinning wall
    #[default]
    Moving,
    /// Treat walls as fixed during the impulse
    Stationary,
}

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Edges that were penetrating and got a positional correction
    pub contacts: u32,
    /// Contacts where the ball was approaching and velocity was changed
    pub impacts: u32,
    /// Deepest penetration corrected this step
    pub max_penetration: f32,
    /// Ball had to be clamped into the fallback bounds
    pub clamped: bool,
}

impl StepReport {
    fn record(&mut self, contact: &Contact, impact: bool) {
        self.contacts += 1;
        if impact {
            self.impacts += 1;
        }
        self.max_penetration = self.max_penetration.max(contact.penetration);
    }
}

/// Ball vs. rotating hexagon physics
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    gravity: f32,
    restitution: f32,
    friction: f32,
    contact_policy: ContactPolicy,
    friction_model: FrictionModel,
    wall_motion: WallMotion,
    bounds: Option<Bounds>,
}

impl PhysicsEngine {
    pub fn new(gravity: f32, restitution: f32, friction: f32) -> Self {
        Self {
            gravity,
            restitution,
            friction,
            contact_policy: ContactPolicy::default(),
            friction_model: FrictionModel::default(),
            wall_motion: WallMotion::default(),
            bounds: None,
        }
    }

    /// Engine for a validated config
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.gravity, config.restitution, config.friction)
            .with_contact_policy(config.contact_policy)
            .with_friction_model(config.friction_model)
            .with_wall_motion(config.wall_motion)
            .with_bounds(config.bounds)
    }

    pub fn with_contact_policy(mut self, policy: ContactPolicy) -> Self {
        self.contact_policy = policy;
        self
    }

    pub fn with_friction_model(mut self, model: FrictionModel) -> Self {
        self.friction_model = model;
        self
    }

    pub fn with_wall_motion(mut self, motion: WallMotion) -> Self {
        self.wall_motion = motion;
        self
    }

    pub fn with_bounds(mut self, bounds: Option<Bounds>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn contact_policy(&self) -> ContactPolicy {
        self.contact_policy
    }

    /// Advance the ball by `dt` and resolve it against every edge.
    ///
    /// The hexagon is expected to already be at its pose for this tick.
    pub fn step(&self, ball: &mut Ball, hexagon: &Hexagon, dt: f32) -> StepReport {
        self.integrate(ball, dt);
        let mut report = self.resolve(ball, hexagon);

        if let Some(bounds) = &self.bounds {
            let radius = ball.radius();
            report.clamped =
                clamp_to_bounds(&mut ball.pos, &mut ball.vel, radius, bounds, self.restitution);
            if report.clamped {
                log::debug!("Ball clamped into fallback bounds at {:?}", ball.pos);
            }
        }
        report
    }

    /// Gravity then position (gravity along +y). Non-positive `dt` does nothing.
    pub fn integrate(&self, ball: &mut Ball, dt: f32) {
        if !(dt > 0.0) {
            if dt != 0.0 {
                log::warn!("PhysicsEngine::integrate ignoring dt = {dt}");
            }
            return;
        }
        ball.vel.y += self.gravity * dt;
        ball.pos += ball.vel * dt;
    }

    /// Test and correct the ball against all six edges, edge 0 first
    pub fn resolve(&self, ball: &mut Ball, hexagon: &Hexagon) -> StepReport {
        let mut report = StepReport::default();
        for edge in hexagon.edges() {
            if let Some((contact, impact)) =
                self.resolve_edge(ball, &edge, hexagon.center(), hexagon.angular_velocity())
            {
                report.record(&contact, impact);
            }
        }
        report
    }

    /// Resolve the ball against a single edge of a body spinning about `center`.
    ///
    /// Returns the contact and whether the velocity was changed, or `None` if
    /// the ball is clear of the edge (or the edge is degenerate).
    pub fn resolve_edge(
        &self,
        ball: &mut Ball,
        edge: &Edge,
        center: Vec2,
        angular_velocity: f32,
    ) -> Option<(Contact, bool)> {
        let contact = ball_edge_contact(ball.pos, ball.radius(), edge, self.contact_policy)?;

        // Push out of the wall first, even if already separating
        ball.pos += contact.normal * contact.penetration;

        let v_wall = match self.wall_motion {
            WallMotion::Moving => wall_velocity(contact.point, center, angular_velocity),
            WallMotion::Stationary => Vec2::ZERO,
        };

        let impact = match self.respond(ball.vel, &contact, v_wall) {
            Some(vel) => {
                log::trace!(
                    "Edge {} impact: vel {:?} -> {:?} (pen {:.3})",
                    contact.edge,
                    ball.vel,
                    vel,
                    contact.penetration
                );
                ball.vel = vel;
                true
            }
            None => false,
        };
        Some((contact, impact))
    }

    /// Post-impact velocity, or `None` if the ball is already separating
    /// from the wall along the contact normal.
    pub fn respond(&self, vel: Vec2, contact: &Contact, v_wall: Vec2) -> Option<Vec2> {
        let n = contact.normal;
        let t = contact.tangent;

        let v_rel = vel - v_wall;
        let v_n = v_rel.dot(n);
        if v_n >= 0.0 {
            return None;
        }
        let v_t = v_rel.dot(t);

        let new_v_n = -self.restitution * v_n;
        let new_v_t = match self.friction_model {
            FrictionModel::Coulomb => {
                let j_n = -(1.0 + self.restitution) * v_n;
                let max_j_t = self.friction * j_n.abs();
                v_t + (-v_t).clamp(-max_j_t, max_j_t)
            }
            FrictionModel::Damping => v_t * (1.0 - self.friction),
        };

        Some(n * new_v_n + t * new_v_t + v_wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::ContactRegion;
    use crate::sim::hexagon::Winding;
    use crate::sim::{Simulation, reflect_velocity};
    use proptest::prelude::*;

    fn floor_contact() -> Contact {
        Contact {
            edge: 1,
            region: ContactRegion::Face,
            point: Vec2::new(0.0, 100.0),
            normal: Vec2::new(0.0, -1.0),
            tangent: Vec2::new(-1.0, 0.0),
            penetration: 1.0,
        }
    }

    fn total_energy(ball: &Ball, gravity: f32) -> f32 {
        // Unit mass, gravity along +y
        0.5 * ball.vel.length_squared() - gravity * ball.pos.y
    }

    #[test]
    fn test_integrate() {
        let engine = PhysicsEngine::new(100.0, 0.8, 0.2);
        let mut ball = Ball::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);
        engine.integrate(&mut ball, 0.5);
        assert_eq!(ball.vel, Vec2::new(10.0, 50.0));
        assert_eq!(ball.pos, Vec2::new(5.0, 25.0));
    }

    #[test]
    fn test_integrate_ignores_negative_dt() {
        let engine = PhysicsEngine::new(100.0, 0.8, 0.2);
        let mut ball = Ball::new(Vec2::ONE, Vec2::ONE, 5.0);
        engine.integrate(&mut ball, -0.1);
        assert_eq!(ball.pos, Vec2::ONE);
        assert_eq!(ball.vel, Vec2::ONE);
    }

    #[test]
    fn test_respond_separating_is_skipped() {
        let engine = PhysicsEngine::new(0.0, 0.8, 0.2);
        // Moving up, away from the floor
        assert!(engine.respond(Vec2::new(5.0, -10.0), &floor_contact(), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_respond_restitution() {
        let engine = PhysicsEngine::new(0.0, 0.5, 0.0);
        let vel = engine.respond(Vec2::new(0.0, 100.0), &floor_contact(), Vec2::ZERO).unwrap();
        assert!((vel - Vec2::new(0.0, -50.0)).length() < 1e-4);
    }

    #[test]
    fn test_elastic_reflection() {
        let engine = PhysicsEngine::new(0.0, 1.0, 0.0);
        let v = Vec2::new(30.0, 40.0);
        let out = engine.respond(v, &floor_contact(), Vec2::ZERO).unwrap();
        assert!((out - reflect_velocity(v, floor_contact().normal)).length() < 1e-4);
        assert!((out.length() - v.length()).abs() < 1e-4);
    }

    #[test]
    fn test_coulomb_sticks_when_slow() {
        // |v_t| = 10 <= mu * |j_n| = 0.5 * 1.8 * 100: sliding stops
        let engine = PhysicsEngine::new(0.0, 0.8, 0.5);
        let out = engine.respond(Vec2::new(10.0, 100.0), &floor_contact(), Vec2::ZERO).unwrap();
        assert!(out.x.abs() < 1e-4);
        assert!((out.y - (-80.0)).abs() < 1e-3);
    }

    #[test]
    fn test_coulomb_caps_when_fast() {
        // j_n = 1.8 * 10 = 18, cap = 0.1 * 18 = 1.8
        let engine = PhysicsEngine::new(0.0, 0.8, 0.1);
        let out = engine.respond(Vec2::new(100.0, 10.0), &floor_contact(), Vec2::ZERO).unwrap();
        assert!((out.x - 98.2).abs() < 1e-3);
        assert!((out.y - (-8.0)).abs() < 1e-4);
    }

    #[test]
    fn test_damping_friction() {
        let engine =
            PhysicsEngine::new(0.0, 0.8, 0.25).with_friction_model(FrictionModel::Damping);
        let out = engine.respond(Vec2::new(100.0, 10.0), &floor_contact(), Vec2::ZERO).unwrap();
        assert!((out.x - 75.0).abs() < 1e-3);
        assert!((out.y - (-8.0)).abs() < 1e-4);
    }

    #[test]
    fn test_moving_wall_transfers_energy() {
        // Floor moving right at 50: a ball dropping straight down gets dragged along
        let engine = PhysicsEngine::new(0.0, 0.8, 0.5);
        let v_wall = Vec2::new(50.0, 0.0);
        let out = engine.respond(Vec2::new(0.0, 100.0), &floor_contact(), v_wall).unwrap();
        assert!((out.x - 50.0).abs() < 1e-3);
        assert!(out.length() > 80.0);

        let still = engine.with_wall_motion(WallMotion::Stationary);
        let mut ball = Ball::new(Vec2::new(0.0, 85.0), Vec2::new(0.0, 100.0), 20.0);
        let floor = Edge::new(1, Vec2::new(100.0, 100.0), Vec2::new(-100.0, 100.0), Winding::CounterClockwise);
        still.resolve_edge(&mut ball, &floor, Vec2::ZERO, 3.0).unwrap();
        assert!(ball.vel.x.abs() < 1e-4);
    }

    #[test]
    fn test_resolve_edge_keeps_correction_when_separating() {
        let engine = PhysicsEngine::new(0.0, 0.8, 0.2);
        let floor = Edge::new(1, Vec2::new(100.0, 100.0), Vec2::new(-100.0, 100.0), Winding::CounterClockwise);
        let mut ball = Ball::new(Vec2::new(0.0, 90.0), Vec2::new(0.0, -10.0), 20.0);
        let (contact, impact) = engine.resolve_edge(&mut ball, &floor, Vec2::ZERO, 0.0).unwrap();
        assert!(!impact);
        assert!((contact.penetration - 10.0).abs() < 1e-4);
        assert!((ball.pos.y - 80.0).abs() < 1e-4);
        assert_eq!(ball.vel, Vec2::new(0.0, -10.0));
    }

    #[test]
    fn test_degenerate_edge_no_nan() {
        let engine = PhysicsEngine::new(980.0, 0.8, 0.2);
        let point = Edge::new(0, Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), Winding::CounterClockwise);
        let mut ball = Ball::new(Vec2::new(5.0, 5.0), Vec2::new(1.0, 2.0), 20.0);
        assert!(engine.resolve_edge(&mut ball, &point, Vec2::ZERO, 1.0).is_none());
        assert!(ball.is_finite());
        assert_eq!(ball.pos, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_degenerate_hexagon_no_nan() {
        // Zero circumradius collapses every edge to a point
        let engine = PhysicsEngine::new(980.0, 0.8, 0.2);
        let hexagon = Hexagon::new(Vec2::new(400.0, 300.0), 0.0, 0.5);
        let mut ball = Ball::new(Vec2::new(400.0, 300.0), Vec2::ZERO, 20.0);
        for _ in 0..10 {
            let report = engine.step(&mut ball, &hexagon, 1.0 / 60.0);
            assert_eq!(report.contacts, 0);
        }
        assert!(ball.is_finite());
    }

    #[test]
    fn test_bounds_fallback() {
        let engine = PhysicsEngine::new(0.0, 0.8, 0.2)
            .with_bounds(Some(Bounds::from_size(800.0, 600.0)));
        // Collapsed hexagon: nothing to collide with but the window edge
        let hexagon = Hexagon::new(Vec2::new(400.0, 300.0), 0.0, 0.0);
        let mut ball = Ball::new(Vec2::new(790.0, 300.0), Vec2::new(100.0, 0.0), 20.0);
        let report = engine.step(&mut ball, &hexagon, 0.0);
        assert!(report.clamped);
        assert_eq!(ball.pos.x, 780.0);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_corner_pushes_out_of_both_walls() {
        let engine = PhysicsEngine::new(0.0, 0.8, 0.2);
        let hexagon = Hexagon::new(Vec2::ZERO, 200.0, 0.0);
        // Just inside vertex 1 (60°), hugging both adjacent walls
        let corner = hexagon.vertex(1) * 0.95;
        let mut ball = Ball::new(corner, corner.normalize() * 50.0, 20.0);
        let report = engine.resolve(&mut ball, &hexagon);
        assert!(report.contacts >= 2);
        for edge in hexagon.edges() {
            assert!(edge.signed_distance(ball.pos) >= 20.0 - 1e-3, "edge {}", edge.index);
        }
        assert!(ball.vel.dot(corner.normalize()) <= 0.0);
    }

    fn scenario_config() -> SimConfig {
        SimConfig {
            gravity: 980.0,
            restitution: 0.8,
            friction: 0.2,
            circumradius: 200.0,
            ball_radius: 20.0,
            angular_velocity: 0.0,
            tick: 1.0 / 60.0,
            ball_start: Vec2::ZERO,
            ball_velocity: Vec2::ZERO,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_drop_from_center_bounces_off_floor() {
        for winding in [Winding::CounterClockwise, Winding::Clockwise] {
            let config = SimConfig {
                winding,
                ..scenario_config()
            };
            let mut sim = Simulation::new(config.clone()).unwrap();
            let mut impacts = 0;
            let mut max_vy: f32 = 0.0;
            for _ in 0..40 {
                let report = sim.step(config.tick).unwrap();
                impacts += report.impacts;
                max_vy = max_vy.max(sim.ball().vel.y);
            }
            assert!(impacts >= 1, "{winding:?}: ball never reached the floor");
            assert!(max_vy > 400.0);
            assert!(sim.ball().vel.y < 0.0, "{winding:?}: ball should be moving up after the bounce");
            assert!(sim.hexagon().contains_point(sim.ball().pos));
        }
    }

    #[test]
    fn test_energy_does_not_increase_through_first_bounce() {
        for policy in [ContactPolicy::Segment, ContactPolicy::HalfPlane] {
            for model in [FrictionModel::Coulomb, FrictionModel::Damping] {
                let config = SimConfig {
                    contact_policy: policy,
                    friction_model: model,
                    ..scenario_config()
                };
                let mut sim = Simulation::new(config.clone()).unwrap();
                let energy = |sim: &Simulation| {
                    let mut ball = sim.ball().clone();
                    ball.pos -= config.center;
                    total_energy(&ball, config.gravity)
                };
                let mut last = energy(&sim);
                let mut impacts = 0;
                // Free fall, impact on the floor, and the start of the rebound
                for tick in 0..40 {
                    impacts += sim.step(config.tick).unwrap().impacts;
                    let next = energy(&sim);
                    assert!(
                        next <= last + 1.0 + 1e-5 * last.abs(),
                        "{policy:?}/{model:?} tick {tick}: energy rose {last} -> {next}"
                    );
                    last = next;
                }
                assert!(impacts >= 1);
            }
        }
    }

    #[test]
    fn test_elastic_bounce_preserves_speed() {
        let config = SimConfig {
            gravity: 0.0,
            restitution: 1.0,
            friction: 0.0,
            ball_velocity: Vec2::new(90.0, 240.0),
            ..scenario_config()
        };
        let speed = config.ball_velocity.length();
        let mut sim = Simulation::new(config.clone()).unwrap();
        let mut impacts = 0;
        for _ in 0..120 {
            impacts += sim.step(config.tick).unwrap().impacts;
            assert!((sim.ball().vel.length() - speed).abs() < 1e-2 * speed);
        }
        assert!(impacts >= 1);
    }

    #[test]
    fn test_spinning_hexagon_keeps_ball_inside() {
        let config = SimConfig {
            angular_velocity: 2.0,
            ball_velocity: Vec2::new(300.0, -200.0),
            ..scenario_config()
        };
        let mut sim = Simulation::new(config.clone()).unwrap();
        for _ in 0..600 {
            sim.step(config.tick).unwrap();
            assert!(sim.hexagon().contains_point(sim.ball().pos));
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let config = SimConfig {
            ball_velocity: Vec2::new(150.0, 20.0),
            ..SimConfig::default()
        };
        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config.clone()).unwrap();
        for _ in 0..300 {
            assert_eq!(a.step(config.tick).unwrap(), b.step(config.tick).unwrap());
        }
        assert_eq!(a.ball(), b.ball());
        assert_eq!(a.hexagon().vertices(), b.hexagon().vertices());
    }

    proptest! {
        #[test]
        fn prop_resolve_leaves_no_penetration(
            angle in -3.1f32..3.1,
            r in 0.0f32..1.0,
            theta in -3.2f32..3.2,
            vx in -500.0f32..500.0,
            vy in -500.0f32..500.0,
            radius in 5.0f32..40.0,
            half_plane in any::<bool>(),
        ) {
            let policy = if half_plane { ContactPolicy::HalfPlane } else { ContactPolicy::Segment };
            let engine = PhysicsEngine::new(980.0, 0.8, 0.2).with_contact_policy(policy);
            let hexagon = Hexagon::new(Vec2::new(400.0, 300.0), 200.0, 0.5).with_angle(angle);
            let start = hexagon.center() + crate::polar_to_cartesian(r * hexagon.apothem(), theta);
            let mut ball = Ball::new(start, Vec2::new(vx, vy), radius);

            engine.resolve(&mut ball, &hexagon);

            for edge in hexagon.edges() {
                if let Some(contact) = ball_edge_contact(ball.pos, radius, &edge, policy) {
                    prop_assert!(contact.penetration < 1e-2, "edge {} pen {}", edge.index, contact.penetration);
                }
            }
            prop_assert!(ball.is_finite());
        }
    }
}
