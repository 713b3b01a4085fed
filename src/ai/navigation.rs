//! Navigation port
//!
//! Agents never plan paths themselves. They issue destination requests to a
//! [`NavigationPort`] and poll it for arrival, the way a character asks a
//! navmesh agent to move. [`GridNavigator`] is the implementation backed by
//! the A* grid in [`pathfinding`](super::pathfinding).
//!
//! # Example
//!
//! ```ignore
//! let mut nav = GridNavigator::new(grid.clone(), spawn).with_speed(5.0);
//! nav.set_destination(point);
//!
//! // every frame
//! nav.advance(dt);
//! if nav.has_arrived() {
//!     // ...
//! }
//! ```

use std::sync::Arc;

use glam::Vec3;

use super::pathfinding::{Grid, TraversalLink, Waypoint, find_path};

// ============================================================================
// Port
// ============================================================================

/// "Navigate to point" service consumed by ground agents.
pub trait NavigationPort {
    /// Current position of the navigating body
    fn position(&self) -> Vec3;

    /// Teleport without pathing (jump landings, respawns).
    fn warp(&mut self, position: Vec3);

    /// Request a path to `target`. Planning completes on the next `advance`.
    fn set_destination(&mut self, target: Vec3);

    /// Drop the current path and stop.
    fn reset_path(&mut self);

    /// True while a requested path has not been planned yet.
    fn is_path_pending(&self) -> bool;

    /// Distance left along the current path; zero without a path.
    fn remaining_distance(&self) -> f32;

    /// Distance from the goal at which the path counts as finished
    fn stopping_distance(&self) -> f32;

    /// Movement speed along paths
    fn set_speed(&mut self, speed: f32);

    /// Link the agent is standing at, if its next leg crosses one.
    fn traversal_link(&self) -> Option<TraversalLink>;

    /// Check if the next leg crosses a traversal link.
    fn is_on_traversal_link(&self) -> bool {
        self.traversal_link().is_some()
    }

    /// Finish crossing the current link: land on its end and resume the path.
    fn complete_traversal_link(&mut self);

    /// Nearest navigable point within `max_distance` of `point`.
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;

    /// Follow the current path for `dt` seconds.
    fn advance(&mut self, dt: f32);

    /// Displace the body outside of path following (knockback, rush).
    ///
    /// Returns the displacement actually applied.
    fn nudge(&mut self, delta: Vec3) -> Vec3;

    /// Velocity produced by the last `advance`
    fn velocity(&self) -> Vec3;

    /// True once a planned path is (nearly) finished.
    fn has_arrived(&self) -> bool {
        !self.is_path_pending() && self.remaining_distance() <= self.stopping_distance()
    }
}

// ============================================================================
// Grid Navigator
// ============================================================================

/// Path follower on a shared [`Grid`].
#[derive(Debug, Clone)]
pub struct GridNavigator {
    grid: Arc<Grid>,
    position: Vec3,
    velocity: Vec3,
    speed: f32,
    stopping_distance: f32,
    pending: Option<Vec3>,
    path: Vec<Waypoint>,
    next: usize,
}

impl GridNavigator {
    /// Create a navigator standing at `position`
    #[must_use]
    pub fn new(grid: Arc<Grid>, position: Vec3) -> Self {
        Self {
            grid,
            position,
            velocity: Vec3::ZERO,
            speed: 3.5,
            stopping_distance: 0.0,
            pending: None,
            path: Vec::new(),
            next: 0,
        }
    }

    /// Set the movement speed
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Set the stopping distance
    #[must_use]
    pub fn with_stopping_distance(mut self, stopping_distance: f32) -> Self {
        self.stopping_distance = stopping_distance.max(0.0);
        self
    }

    /// The grid this navigator plans on
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Check if a planned path is being followed
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.next < self.path.len()
    }

    fn plan(&mut self, target: Vec3) {
        let result = find_path(&self.grid, self.position, target);
        if result.is_empty() {
            log::warn!(
                "no path from {:?} to {:?}",
                self.grid.world_to_cell(self.position),
                self.grid.world_to_cell(target)
            );
        }
        self.path = result.waypoints;
        self.next = 0;
    }

    fn at_link(&self) -> bool {
        self.path
            .get(self.next)
            .is_some_and(|waypoint| waypoint.link.is_some())
    }
}

impl NavigationPort for GridNavigator {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_destination(&mut self, target: Vec3) {
        self.pending = Some(target);
    }

    fn reset_path(&mut self) {
        self.pending = None;
        self.path.clear();
        self.next = 0;
        self.velocity = Vec3::ZERO;
    }

    fn is_path_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn remaining_distance(&self) -> f32 {
        if !self.has_path() {
            return 0.0;
        }
        let mut remaining = 0.0;
        let mut previous = Vec3::new(self.position.x, 0.0, self.position.z);
        for waypoint in &self.path[self.next..] {
            remaining += previous.distance(waypoint.position);
            previous = waypoint.position;
        }
        remaining
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn traversal_link(&self) -> Option<TraversalLink> {
        self.path.get(self.next).and_then(|waypoint| waypoint.link)
    }

    fn complete_traversal_link(&mut self) {
        if let Some(link) = self.traversal_link() {
            self.position = link.end;
            self.next += 1;
        }
    }

    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        self.grid.sample_position(point, max_distance)
    }

    fn advance(&mut self, dt: f32) {
        if let Some(target) = self.pending.take() {
            self.plan(target);
        }

        self.velocity = Vec3::ZERO;
        if dt <= 0.0 || self.at_link() {
            return;
        }

        let start = self.position;
        let mut budget = self.speed * dt;
        while budget > 0.0 && self.has_path() && !self.at_link() {
            if self.remaining_distance() <= self.stopping_distance {
                break;
            }
            let target = self.path[self.next].position;
            let to_target = target - self.position;
            let distance = to_target.length();
            if distance <= budget {
                self.position = target;
                budget -= distance;
                self.next += 1;
            } else {
                self.position += to_target / distance * budget;
                budget = 0.0;
            }
        }

        if !self.has_path() {
            self.path.clear();
            self.next = 0;
        }
        self.velocity = (self.position - start) / dt;
    }

    fn nudge(&mut self, delta: Vec3) -> Vec3 {
        let candidates = [
            delta,
            Vec3::new(delta.x, delta.y, 0.0),
            Vec3::new(0.0, delta.y, delta.z),
        ];
        for candidate in candidates {
            let next = self.position + candidate;
            if self.grid.is_walkable_at(next) {
                self.position = next;
                return candidate;
            }
        }
        Vec3::ZERO
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

// ============================================================================
// Tests
// ============================================================================
