//! Collision detection between the ball and the hexagon walls
//!
//! Each edge is tested on its own. A contact carries everything the impulse
//! step needs: the contact point, a unit normal pointing from the wall toward
//! the ball (into the hexagon), a unit tangent, and the penetration depth.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hexagon::{Edge, Winding};
use crate::perp;

/// How a ball is tested against one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPolicy {
    /// Closest point on the finite segment.
    ///
    /// Between the endpoints the signed line distance along the inward normal
    /// is used. Past an endpoint the ball collides with the vertex itself and
    /// the normal runs from the vertex to the ball center. A center that is
    /// behind the wall line always uses the face normal so a tunneled ball is
    /// pushed back inside.
    #[default]
    Segment,
    /// Infinite edge line (half-plane test)
    HalfPlane,
}

impl ContactPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactPolicy::Segment => "segment",
            ContactPolicy::HalfPlane => "half_plane",
        }
    }
}

/// Which part of the edge was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRegion {
    Face,
    Vertex,
}

/// A penetrating contact between the ball and one edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Edge index (0..6)
    pub edge: usize,
    pub region: ContactRegion,
    /// Contact point on the wall
    pub point: Vec2,
    /// Unit normal from the wall toward the ball center
    pub normal: Vec2,
    /// Unit tangent perpendicular to `normal`
    pub tangent: Vec2,
    /// Depth to push the ball out along `normal`
    pub penetration: f32,
}

/// Check a ball against one edge
///
/// Returns `None` when the ball is clear of the edge or the edge is degenerate.
pub fn ball_edge_contact(
    ball_pos: Vec2,
    ball_radius: f32,
    edge: &Edge,
    policy: ContactPolicy,
) -> Option<Contact> {
    if edge.is_degenerate() {
        return None;
    }

    let normal = edge.inward_normal();
    let distance = edge.signed_distance(ball_pos);
    let face = |point: Vec2| {
        (distance < ball_radius).then(|| Contact {
            edge: edge.index,
            region: ContactRegion::Face,
            point,
            normal,
            tangent: edge.tangent(),
            penetration: ball_radius - distance,
        })
    };

    match policy {
        ContactPolicy::HalfPlane => face(ball_pos - normal * distance),
        ContactPolicy::Segment => {
            let s = edge.projection(ball_pos);
            if (0.0..=1.0).contains(&s) || distance < 0.0 {
                return face(edge.closest_point(ball_pos));
            }

            let vertex = if s < 0.0 { edge.start } else { edge.end };
            let offset = ball_pos - vertex;
            let dist = offset.length();
            if dist >= ball_radius {
                return None;
            }
            let normal = offset.normalize_or_zero();
            if normal == Vec2::ZERO {
                return face(vertex);
            }
            Some(Contact {
                edge: edge.index,
                region: ContactRegion::Vertex,
                point: vertex,
                normal,
                tangent: tangent_for(normal, edge.winding),
                penetration: ball_radius - dist,
            })
        }
    }
}

/// Tangent whose inward normal (under `winding`) is `normal`
#[inline]
fn tangent_for(normal: Vec2, winding: Winding) -> Vec2 {
    match winding {
        Winding::CounterClockwise => -perp(normal),
        Winding::Clockwise => perp(normal),
    }
}

/// Linear velocity of a point rigidly attached to a body spinning about
/// `center`: `ω × r`, i.e. `ω · (-Δy, Δx)`
#[inline]
pub fn wall_velocity(point: Vec2, center: Vec2, angular_velocity: f32) -> Vec2 {
    perp(point - center) * angular_velocity
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Axis-aligned rectangle used as a last-resort containment box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Window-sized box with its origin at (0, 0)
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn is_empty(&self) -> bool {
        !(self.max.x > self.min.x && self.max.y > self.min.y)
    }
}

/// Clamp the ball inside `bounds`, bouncing off any side it crossed
///
/// Returns true if the ball had to be moved.
pub fn clamp_to_bounds(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    bounds: &Bounds,
    restitution: f32,
) -> bool {
    let mut clamped = false;
    let lo = bounds.min + Vec2::splat(radius);
    let hi = bounds.max - Vec2::splat(radius);

    if pos.x < lo.x {
        pos.x = lo.x;
        vel.x = vel.x.abs() * restitution;
        clamped = true;
    } else if pos.x > hi.x {
        pos.x = hi.x;
        vel.x = -vel.x.abs() * restitution;
        clamped = true;
    }

    if pos.y < lo.y {
        pos.y = lo.y;
        vel.y = vel.y.abs() * restitution;
        clamped = true;
    } else if pos.y > hi.y {
        pos.y = hi.y;
        vel.y = -vel.y.abs() * restitution;
        clamped = true;
    }

    clamped
}
