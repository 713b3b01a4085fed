//! Steering helpers for AI movement
//!
//! Frame-rate independent smoothing and facing. Forward is -Z and yaw
//! rotates about +Y, matching [`Transform::forward`](crate::ecs::Transform::forward).

use glam::{Quat, Vec3};

/// Critically damped spring toward `target`.
///
/// `velocity` carries state between calls. Never overshoots the target and
/// limits travel to `max_speed`.
pub fn smooth_damp(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let max_change = max_speed * smooth_time;
    let change = (current - target).clamp_length_max(max_change);
    let clamped_target = current - change;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = clamped_target + (change + temp) * exp;

    // Overshoot check
    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = (output - target) / dt;
    }
    output
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let to_target = target - current;
    let distance = to_target.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + to_target / distance * max_delta
    }
}

/// Yaw-only rotation facing along the horizontal part of `direction`.
///
/// Returns `None` when the direction has no horizontal component.
pub fn yaw_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= 1e-8 {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z)))
}

/// Yaw and pitch rotation facing along `direction`.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }
    let yaw = f32::atan2(-direction.x, -direction.z);
    let pitch = direction.y.clamp(-1.0, 1.0).asin();
    Some(Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch))
}

/// Rotate toward `target` by at most `max_radians`.
pub fn rotate_towards(current: Quat, target: Quat, max_radians: f32) -> Quat {
    let angle = current.angle_between(target);
    if angle <= max_radians || angle <= f32::EPSILON {
        return target;
    }
    current.slerp(target, max_radians / angle)
}

/// Exponential-style slerp step used for body turning (`rate * dt` per frame).
pub fn slerp_towards(current: Quat, target: Quat, rate: f32, dt: f32) -> Quat {
    current.slerp(target, (rate * dt).clamp(0.0, 1.0))
}
