//! Common ECS components

use glam::{Quat, Vec3};

use crate::combat::{Damage, Damageable, Posture, Stat, resolve_hit};
use crate::physics::Layer;

/// Position and orientation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X in local space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y in local space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Map a point from local space to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// What a body represents in the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// The player the monsters hunt and the drones follow
    Player,
    /// A ground monster (elite included)
    Monster,
    /// A support drone
    Drone,
    /// A destructible prop
    Prop,
}

/// Physical presence of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Body kind
    pub kind: BodyKind,
    /// Collision layer the collider lives on
    pub layer: Layer,
    /// Collider radius
    pub radius: f32,
    /// Collider height (0 for spheres)
    pub height: f32,
    /// Inactive bodies are skipped by queries and perception
    pub active: bool,
}

impl Body {
    /// Create an active body
    pub fn new(kind: BodyKind, layer: Layer, radius: f32, height: f32) -> Self {
        Self {
            kind,
            layer,
            radius,
            height,
            active: true,
        }
    }
}

/// Health and stamina of a damageable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    /// Health
    pub health: Stat,
    /// Stamina (zero max for bodies that never spend any)
    pub stamina: Stat,
}

impl Vitals {
    /// Vitals with health only
    pub fn new(health: Stat) -> Self {
        Self {
            health,
            stamina: Stat::new(0.0),
        }
    }

    /// Add stamina
    pub fn with_stamina(mut self, stamina: Stat) -> Self {
        self.stamina = stamina;
        self
    }

    /// Check if health reached zero
    pub fn is_dead(&self) -> bool {
        self.health.is_depleted()
    }

    /// Regenerate both stats
    pub fn regenerate(&mut self, dt: f32) {
        if self.is_dead() {
            return;
        }
        self.health.regenerate(dt);
        self.stamina.regenerate(dt);
    }
}

impl Damageable for Vitals {
    fn try_take_damage(&mut self, damage: &Damage, _ctx: &mut ()) -> bool {
        resolve_hit(&mut self.health, damage, Posture::Normal).landed()
    }
}

/// Externally applied push that fades out over time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Impact {
    /// Current push velocity
    pub velocity: Vec3,
}

impl Impact {
    /// Add a push of `force` along the horizontal part of `direction`.
    pub fn add(&mut self, direction: Vec3, force: f32) {
        let flat = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        self.velocity += flat * force;
    }

    /// Displacement for this frame; decays the push toward zero.
    pub fn step(&mut self, dt: f32, decay: f32) -> Vec3 {
        let displacement = self.velocity * dt;
        self.velocity = self.velocity.lerp(Vec3::ZERO, (decay * dt).clamp(0.0, 1.0));
        if self.velocity.length_squared() < 1e-4 {
            self.velocity = Vec3::ZERO;
        }
        displacement
    }
}

/// Blast set off when the body is destroyed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosive {
    /// Reach of the blast
    pub radius: f32,
    /// Damage dealt to everything in reach
    pub damage: f32,
}

/// Whether the body is taking cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cover(pub bool);

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
