//! Damage events and the damage-receiving interface

use glam::Vec3;
use hecs::Entity;

/// A single hit, passed by value into [`Damageable::try_take_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damage {
    /// Health removed by the hit
    pub value: f32,
    /// Direction the hit travelled (attacker → victim)
    pub hit_direction: Vec3,
    /// World-space impact point
    pub hit_point: Vec3,
    /// Entity that dealt the hit, if any
    pub source: Option<Entity>,
    /// Critical hit flag (feedback only)
    pub critical: bool,
}

impl Damage {
    /// Plain hit with no direction or source.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            value,
            hit_direction: Vec3::ZERO,
            hit_point: Vec3::ZERO,
            source: None,
            critical: false,
        }
    }

    /// Set the travel direction of the hit.
    #[must_use]
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.hit_direction = direction;
        self
    }

    /// Set the impact point.
    #[must_use]
    pub fn at(mut self, point: Vec3) -> Self {
        self.hit_point = point;
        self
    }

    /// Set the attacking entity.
    #[must_use]
    pub fn with_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    /// Mark as critical.
    #[must_use]
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Hit direction flattened onto the ground plane.
    #[must_use]
    pub fn horizontal_direction(&self) -> Vec3 {
        Vec3::new(self.hit_direction.x, 0.0, self.hit_direction.z).normalize_or_zero()
    }
}

/// Anything that can be hurt: monsters, drones, props, the player.
///
/// `C` is the context the victim needs to react (emit events, change
/// state). Passive holders such as [`Vitals`](crate::ecs::Vitals) use `()`.
pub trait Damageable<C: ?Sized = ()> {
    /// Apply a hit.
    ///
    /// Returns `false` when the hit was rejected (already dead, inactive),
    /// in which case nothing changed.
    fn try_take_damage(&mut self, damage: &Damage, ctx: &mut C) -> bool;
}
