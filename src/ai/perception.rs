//! Perception helpers
//!
//! Range checks compare squared distances. Targets are weak handles that
//! are re-read every tick, so everything here works on a [`BodySnapshot`]
//! taken that frame.

use glam::{Quat, Vec3};
use hecs::Entity;
use smallvec::SmallVec;

/// What an agent can see of another body this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    /// The body
    pub entity: Entity,
    /// Ground position
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Inactive bodies are pooled or despawning
    pub active: bool,
    /// Health reached zero
    pub dead: bool,
    /// Taking cover (drones hold a lower offset)
    pub in_cover: bool,
}

impl BodySnapshot {
    /// A target worth tracking: active and alive.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.active && !self.dead
    }
}

/// Squared distance between two points
#[must_use]
#[inline]
pub fn distance_sq(a: Vec3, b: Vec3) -> f32 {
    a.distance_squared(b)
}

/// `distance(a, b) <= range`
#[must_use]
#[inline]
pub fn within_range(a: Vec3, b: Vec3, range: f32) -> bool {
    distance_sq(a, b) <= range * range
}

/// `distance(a, b) > range`
#[must_use]
#[inline]
pub fn beyond_range(a: Vec3, b: Vec3, range: f32) -> bool {
    distance_sq(a, b) > range * range
}

/// Horizontal direction from `from` to `to`, zero if they coincide
#[must_use]
pub fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    let delta = to - from;
    Vec3::new(delta.x, 0.0, delta.z).normalize_or_zero()
}

/// Inline capacity of [`ScanBuffer`]; larger scans spill to the heap.
pub const SCAN_INLINE: usize = 16;

/// Reusable, bounded result buffer for area scans.
///
/// Owned by the scanning agent and cleared before every sweep; results
/// beyond `capacity` are dropped.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    hits: SmallVec<[Entity; SCAN_INLINE]>,
    capacity: usize,
}

impl ScanBuffer {
    /// Create an empty buffer holding at most `capacity` results
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            hits: SmallVec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop all results
    pub fn clear(&mut self) {
        self.hits.clear();
    }

    /// Record a result; returns `false` once full.
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.hits.len() >= self.capacity {
            return false;
        }
        self.hits.push(entity);
        true
    }

    /// Check if no more results fit
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    /// Maximum number of results
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of results
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if the last scan found nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Results of the last scan
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.hits.iter().copied()
    }
}

/// Nearest valid body among `candidates` as seen from `origin`.
pub fn nearest_valid(
    origin: Vec3,
    candidates: impl IntoIterator<Item = BodySnapshot>,
) -> Option<BodySnapshot> {
    let distance = |body: &BodySnapshot| distance_sq(origin, body.position);
    candidates
        .into_iter()
        .filter(BodySnapshot::is_valid)
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
}
