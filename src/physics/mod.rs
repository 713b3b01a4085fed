//! Spatial query module
//!
//! Built on top of rapier3d

mod layers;
mod world;

pub use layers::Layer;
pub use world::{ColliderHandle, Physics, RayHit};
