//! AI and navigation module
//!
//! Provides the state machine core, perception and steering helpers, grid
//! pathfinding behind a navigation port, and the agents built on top:
//! ground monsters (with the elite rush) and escort drones.

mod drone;
mod fsm;
mod monster;
mod navigation;
mod pathfinding;
mod perception;
mod steering;

pub use drone::{Drone, DroneState, Tracer, TracerPool};
pub use fsm::{DelayedTask, StateMachine, StateTag, Stateful, Transition};
pub use monster::{EliteSkill, Monster, MonsterState, MonsterTask};
pub use navigation::{GridNavigator, NavigationPort};
pub use pathfinding::{Grid, PathResult, TraversalLink, Waypoint, find_path};
pub use perception::{
    BodySnapshot, SCAN_INLINE, ScanBuffer, beyond_range, distance_sq, flat_direction,
    nearest_valid, within_range,
};
pub use steering::{
    look_rotation, move_towards, rotate_towards, slerp_towards, smooth_damp, yaw_rotation,
};

/// Uniform sample in `[min, max]`.
pub(crate) fn random_range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.f32() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_range_bounds() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..200 {
            let value = random_range(&mut rng, 2.0, 5.0);
            assert!((2.0..=5.0).contains(&value), "{value} out of range");
        }
        assert_eq!(random_range(&mut rng, 4.0, 4.0), 4.0);
    }
}
