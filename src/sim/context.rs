//! Simulation context
//!
//! Everything an agent may ask of the world while it ticks. Agents receive
//! the context as an argument instead of reaching for global managers, so
//! the same agent code runs inside [`Simulation`](super::Simulation) and
//! inside scripted test worlds.

use fastrand::Rng;
use glam::Vec3;
use hecs::Entity;

use crate::ai::{BodySnapshot, ScanBuffer};
use crate::combat::Damage;
use crate::core::AiEvent;
use crate::physics::{Layer, RayHit};

/// Coarse game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Encounter is being set up; agents move but do not deal damage
    #[default]
    Ready,
    /// Normal play
    Playing,
    /// The player died
    GameOver,
}

impl GameState {
    /// Check if attacks should deal damage
    #[must_use]
    #[inline]
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Services an agent can use during its tick.
pub trait SimContext {
    /// Current game flow state
    fn game_state(&self) -> GameState;

    /// Shared random source
    fn rng(&mut self) -> &mut Rng;

    /// Publish a fire-and-forget notification.
    fn emit(&mut self, event: AiEvent);

    /// The body monsters hunt and drones escort, if any.
    fn primary_target(&self) -> Option<Entity>;

    /// Resolve a weak handle; `None` once the entity is gone.
    fn locate(&self, entity: Entity) -> Option<BodySnapshot>;

    /// Deliver a hit through the target's damage interface.
    ///
    /// Returns `false` if the target rejected it or does not exist.
    fn apply_damage(&mut self, target: Entity, damage: &Damage) -> bool;

    /// Shove a body along the horizontal part of `direction`.
    fn push_body(&mut self, target: Entity, direction: Vec3, force: f32);

    /// Fill `out` with bodies on `mask` overlapping a sphere.
    fn scan(
        &self,
        center: Vec3,
        radius: f32,
        mask: Layer,
        exclude: Option<Entity>,
        out: &mut ScanBuffer,
    );

    /// First hit along a ray.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layer,
        exclude: Option<Entity>,
    ) -> Option<RayHit>;
}
