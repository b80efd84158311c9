//! Rotating regular hexagon geometry
//!
//! The hexagon is stored as a pose (center, circumradius, rotation angle) and
//! its vertices are recomputed on every query:
//! - vertex i sits at `center + R * (cos(angle ± i·π/3), sin(angle ± i·π/3))`
//! - edge i runs from vertex i to vertex (i + 1) mod 6
//!
//! The sign in the vertex angle is the [`Winding`]. The inward normal of every
//! edge is derived from that same winding, so the two can never disagree.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEGENERATE_EDGE_LENGTH, HEX_SIDES, HEX_STEP};
use crate::error::SimError;
use crate::{normalize_angle, perp, polar_to_cartesian};

/// Vertex ordering around the hexagon
///
/// Named for a y-up frame. On a y-down screen `CounterClockwise` appears
/// clockwise; the normal convention is unaffected because it only depends on
/// the sign of the vertex angle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Vertex angles increase with index; interior is left of each edge
    #[default]
    CounterClockwise,
    /// Vertex angles decrease with index; interior is right of each edge
    Clockwise,
}

impl Winding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winding::CounterClockwise => "counter_clockwise",
            Winding::Clockwise => "clockwise",
        }
    }

    /// Sign applied to the per-vertex angle step
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Winding::CounterClockwise => 1.0,
            Winding::Clockwise => -1.0,
        }
    }

    /// Inward unit normal for an edge with the given unit tangent
    #[inline]
    pub fn inward_normal(&self, tangent: Vec2) -> Vec2 {
        match self {
            Winding::CounterClockwise => perp(tangent),
            Winding::Clockwise => -perp(tangent),
        }
    }
}

/// One boundary edge, from `start` to `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub index: usize,
    pub start: Vec2,
    pub end: Vec2,
    pub winding: Winding,
}

impl Edge {
    pub fn new(index: usize, start: Vec2, end: Vec2, winding: Winding) -> Self {
        Self {
            index,
            start,
            end,
            winding,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Zero-length edges have no direction and are skipped by collision
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length() < DEGENERATE_EDGE_LENGTH
    }

    /// Unit tangent (zero for a degenerate edge)
    #[inline]
    pub fn tangent(&self) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Unit normal pointing into the hexagon (zero for a degenerate edge)
    #[inline]
    pub fn inward_normal(&self) -> Vec2 {
        self.winding.inward_normal(self.tangent())
    }

    /// Signed distance from the edge line, positive on the interior side
    #[inline]
    pub fn signed_distance(&self, point: Vec2) -> f32 {
        (point - self.start).dot(self.inward_normal())
    }

    /// Projection parameter of `point` onto the edge, unclamped
    /// (0 at `start`, 1 at `end`)
    pub fn projection(&self, point: Vec2) -> f32 {
        let edge = self.end - self.start;
        let len_sq = edge.length_squared();
        if len_sq <= DEGENERATE_EDGE_LENGTH * DEGENERATE_EDGE_LENGTH {
            return 0.0;
        }
        (point - self.start).dot(edge) / len_sq
    }

    /// Closest point on the segment to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let s = self.projection(point).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * s
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }
}

/// A regular hexagon spinning about a fixed center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hexagon {
    center: Vec2,
    circumradius: f32,
    /// Current rotation (radians, kept in [-π, π))
    angle: f32,
    /// Spin rate (radians/sec)
    angular_velocity: f32,
    winding: Winding,
}

impl Hexagon {
    pub fn new(center: Vec2, circumradius: f32, angular_velocity: f32) -> Self {
        Self {
            center,
            circumradius,
            angle: 0.0,
            angular_velocity,
            winding: Winding::default(),
        }
    }

    pub fn with_winding(mut self, winding: Winding) -> Self {
        self.winding = winding;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = normalize_angle(angle);
        self
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn circumradius(&self) -> f32 {
        self.circumradius
    }

    /// Distance from center to each edge midpoint
    #[inline]
    pub fn apothem(&self) -> f32 {
        self.circumradius * (HEX_STEP / 2.0).cos()
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    #[inline]
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Rotate by `angular_velocity * dt`. Negative or NaN `dt` is ignored.
    pub fn advance(&mut self, dt: f32) {
        if !(dt > 0.0) {
            if dt != 0.0 {
                log::warn!("Hexagon::advance ignoring dt = {dt}");
            }
            return;
        }
        self.angle = normalize_angle(self.angle + self.angular_velocity * dt);
    }

    /// Position of vertex `i` (taken modulo 6)
    #[inline]
    pub fn vertex(&self, i: usize) -> Vec2 {
        let theta = self.angle + self.winding.sign() * (i % HEX_SIDES) as f32 * HEX_STEP;
        self.center + polar_to_cartesian(self.circumradius, theta)
    }

    /// The six vertices in winding order
    pub fn vertices(&self) -> [Vec2; HEX_SIDES] {
        std::array::from_fn(|i| self.vertex(i))
    }

    /// Edge `i`, from vertex i to vertex (i + 1) mod 6
    pub fn edge(&self, i: usize) -> Result<Edge, SimError> {
        if i >= HEX_SIDES {
            return Err(SimError::IndexOutOfRange(i));
        }
        Ok(Edge::new(i, self.vertex(i), self.vertex(i + 1), self.winding))
    }

    /// All six edges in index order
    pub fn edges(&self) -> impl Iterator<Item = Edge> + use<> {
        let vertices = self.vertices();
        let winding = self.winding;
        (0..HEX_SIDES)
            .map(move |i| Edge::new(i, vertices[i], vertices[(i + 1) % HEX_SIDES], winding))
    }

    /// Whether `point` lies inside (or on) the hexagon
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.edges().all(|e| e.signed_distance(point) >= 0.0)
    }
}
