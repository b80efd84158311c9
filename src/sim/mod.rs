//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (edge 0 through edge 5)
//! - No rendering or platform dependencies

pub mod collision;
pub mod hexagon;
pub mod state;
pub mod tick;

pub use collision::{
    Bounds, Contact, ContactPolicy, ContactRegion, ball_edge_contact, clamp_to_bounds,
    reflect_velocity, wall_velocity,
};
pub use hexagon::{Edge, Hexagon, Winding};
pub use state::{Ball, Frame, Simulation};
pub use tick::{FrictionModel, PhysicsEngine, StepReport, WallMotion};
