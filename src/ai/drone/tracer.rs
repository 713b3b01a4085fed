//! Hit-scan tracers
//!
//! A fixed ring of line segments reused round-robin. A tracer's head runs
//! from the muzzle to the end point at a fixed speed with the tail a
//! segment length behind it; it goes dark once the tail arrives.

use glam::Vec3;

/// One travelling segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracer {
    origin: Vec3,
    direction: Vec3,
    total: f32,
    length: f32,
    travelled: f32,
    active: bool,
}

impl Tracer {
    const IDLE: Self = Self {
        origin: Vec3::ZERO,
        direction: Vec3::ZERO,
        total: 0.0,
        length: 0.0,
        travelled: 0.0,
        active: false,
    };

    /// Leading end, never past the end point
    #[must_use]
    pub fn head(&self) -> Vec3 {
        self.origin + self.direction * self.travelled.min(self.total)
    }

    /// Trailing end
    #[must_use]
    pub fn tail(&self) -> Vec3 {
        let tail = (self.travelled - self.length).max(0.0);
        self.origin + self.direction * tail.min(self.total)
    }

    /// Where the round stopped
    #[must_use]
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.total
    }

    /// Check if the segment is still visible
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn advance(&mut self, distance: f32) {
        if !self.active {
            return;
        }
        self.travelled += distance;
        if self.travelled - self.length >= self.total {
            self.active = false;
        }
    }
}

/// Round-robin tracer ring owned by one drone.
#[derive(Debug, Clone)]
pub struct TracerPool {
    tracers: Vec<Tracer>,
    next: usize,
    speed: f32,
    max_length: f32,
}

impl TracerPool {
    /// Create `size` idle tracers.
    #[must_use]
    pub fn new(size: usize, speed: f32, max_length: f32) -> Self {
        Self {
            tracers: vec![Tracer::IDLE; size],
            next: 0,
            speed,
            max_length,
        }
    }

    /// Launch a tracer from `origin` to `end`, recycling the oldest slot.
    ///
    /// Returns the slot used, or `None` for an empty ring.
    pub fn spawn(&mut self, origin: Vec3, end: Vec3) -> Option<usize> {
        if self.tracers.is_empty() {
            return None;
        }
        let slot = self.next;
        self.next = (self.next + 1) % self.tracers.len();

        let total = origin.distance(end);
        self.tracers[slot] = Tracer {
            origin,
            direction: (end - origin).normalize_or_zero(),
            total,
            length: self.max_length.min(total),
            travelled: 0.0,
            active: true,
        };
        Some(slot)
    }

    /// Move every live tracer along by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let distance = self.speed * dt;
        for tracer in &mut self.tracers {
            tracer.advance(distance);
        }
    }

    /// Hide every tracer.
    pub fn clear(&mut self) {
        self.tracers.fill(Tracer::IDLE);
        self.next = 0;
    }

    /// Tracer in `slot`
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Tracer> {
        self.tracers.get(slot)
    }

    /// Visible tracers
    pub fn active(&self) -> impl Iterator<Item = &Tracer> {
        self.tracers.iter().filter(|t| t.active)
    }

    /// Number of visible tracers
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Ring size
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    /// Check if the ring has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_runs_until_tail_arrives() {
        let mut pool = TracerPool::new(3, 80.0, 1.0);
        let slot = pool.spawn(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(slot, Some(0));

        pool.advance(0.05);
        let tracer = pool.get(0).copied().unwrap_or(Tracer::IDLE);
        assert!(tracer.is_active());
        assert!((tracer.head().z + 4.0).abs() < 1e-4);
        assert!((tracer.tail().z + 3.0).abs() < 1e-4);

        pool.advance(0.05);
        assert_eq!(pool.active_count(), 1);

        pool.advance(0.05);
        assert_eq!(pool.active_count(), 0, "tail reached the end point");
    }

    #[test]
    fn test_head_stops_at_end_point() {
        let mut pool = TracerPool::new(1, 80.0, 1.0);
        pool.spawn(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));
        pool.advance(0.07);

        let tracer = pool.get(0).copied().unwrap_or(Tracer::IDLE);
        assert!(tracer.is_active());
        assert_eq!(tracer.head(), tracer.end());
        assert!(tracer.tail().x < 5.0);
    }

    #[test]
    fn test_short_shot_shrinks_segment() {
        let mut pool = TracerPool::new(1, 80.0, 1.0);
        pool.spawn(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0));
        pool.advance(0.001);

        // Segment length is capped by the shot distance
        let tracer = pool.get(0).copied().unwrap_or(Tracer::IDLE);
        assert_eq!(tracer.tail(), Vec3::ZERO);
    }

    #[test]
    fn test_round_robin_reuse() {
        let mut pool = TracerPool::new(2, 80.0, 1.0);
        let slots: Vec<_> = (0..3)
            .map(|i| pool.spawn(Vec3::ZERO, Vec3::new(i as f32 + 1.0, 0.0, 0.0)))
            .collect();

        assert_eq!(slots, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(pool.active_count(), 2);
        let reused = pool.get(0).copied().unwrap_or(Tracer::IDLE);
        assert_eq!(reused.end(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_ring_spawns_nothing() {
        let mut pool = TracerPool::new(0, 80.0, 1.0);
        assert!(pool.is_empty());
        assert_eq!(pool.spawn(Vec3::ZERO, Vec3::X), None);
    }
}
