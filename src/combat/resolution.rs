//! Hit resolution shared by every agent
//!
//! Decides what a hit does to its victim: rejected, lethal, absorbed by
//! hyper-armor, or a stagger with knockback.

use glam::Vec3;

use super::{Damage, Stat};

/// How the victim is currently able to react to hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    /// Hits stagger and push the victim
    Normal,
    /// Hits still hurt but never interrupt the current action
    HyperArmor,
    /// Victim is dead or inactive; hits are rejected
    Down,
}

/// Outcome of applying a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Nothing happened
    Rejected,
    /// Health reached zero
    Killed,
    /// Health lost, action not interrupted
    Absorbed,
    /// Health lost, victim should enter its hit reaction
    Staggered,
}

impl HitOutcome {
    /// True for every outcome that applied damage.
    #[must_use]
    pub fn landed(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Apply `damage` to `health` according to `posture`.
pub fn resolve_hit(health: &mut Stat, damage: &Damage, posture: Posture) -> HitOutcome {
    if posture == Posture::Down || health.is_depleted() {
        return HitOutcome::Rejected;
    }

    health.decrease(damage.value);

    if health.is_depleted() {
        HitOutcome::Killed
    } else if posture == Posture::HyperArmor {
        HitOutcome::Absorbed
    } else {
        HitOutcome::Staggered
    }
}

/// A timed push along a fixed horizontal direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    direction: Vec3,
    force: f32,
    remaining: f32,
}

impl Knockback {
    /// Create a push; the direction is flattened and normalized.
    #[must_use]
    pub fn new(direction: Vec3, force: f32, duration: f32) -> Self {
        Self {
            direction: Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero(),
            force,
            remaining: duration.max(0.0),
        }
    }

    /// Displacement for this frame; consumes `dt` of the remaining time.
    pub fn step(&mut self, dt: f32) -> Vec3 {
        let slice = dt.min(self.remaining).max(0.0);
        self.remaining -= slice;
        self.direction * self.force * slice
    }

    /// True once the full duration has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Push direction
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}
